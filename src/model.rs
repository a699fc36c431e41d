// Copyright 2026 the mywellness_tcx_convert authors
//
// This file is part of mywellness_tcx_convert.
//
// mywellness_tcx_convert is free software: you can redistribute it and/or
// modify it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the License,
// or (at your option) any later version.
//
// mywellness_tcx_convert is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero
// General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with mywellness_tcx_convert. If not, see
// <https://www.gnu.org/licenses/>.

//! Data model of the MyWellness JSON workout export.
//!
//! Field names follow the vendor file verbatim, including the `analitics`
//! spelling. Unknown fields in the export are ignored.

use serde::Deserialize;

/// Top-level export document.
#[derive(Debug, Deserialize)]
pub struct WorkoutExport {
    pub data: WorkoutData,
}

/// The actual workout record inside the export.
#[derive(Debug, Deserialize)]
pub struct WorkoutData {
    /// Workout date as `DD/MM/YYYY`.
    pub date: String,
    /// Total workout duration in seconds.
    #[serde(default)]
    pub duration: f64,
    pub analitics: Analytics,
}

/// Recorded telemetry: channel layout, samples, and the heart-rate series.
#[derive(Debug, Deserialize)]
pub struct Analytics {
    pub descriptor: Vec<ChannelDescriptor>,
    pub samples: Vec<Sample>,
    /// Heart rate is delivered as a separate series, not as a channel.
    #[serde(default)]
    pub hr: Vec<HeartRateSample>,
}

/// Maps one position in a sample's value array to a named metric.
#[derive(Debug, Deserialize)]
pub struct ChannelDescriptor {
    /// Index into [`Sample::vs`].
    pub i: usize,
    pub pr: ChannelProperties,
}

#[derive(Debug, Deserialize)]
pub struct ChannelProperties {
    /// Metric name, e.g. "Power", "HDistance", "Rpm", or "Speed".
    pub name: String,
}

/// One time-indexed sample.
#[derive(Debug, Deserialize)]
pub struct Sample {
    /// Offset in seconds from the start of the workout.
    pub t: f64,
    /// Channel values, positionally matching the descriptor indices.
    pub vs: Vec<f64>,
}

/// One entry of the separate heart-rate series.
#[derive(Debug, Deserialize)]
pub struct HeartRateSample {
    /// Offset in seconds from the start of the workout.
    pub t: f64,
    /// Heart rate in beats per minute.
    pub hr: f64,
}
