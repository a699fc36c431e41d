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

//! Library for converting a [MyWellness](https://www.mywellness.com/)
//! (Technogym) JSON workout export to
//! [TCX](https://www8.garmin.com/xmlschemas/TrainingCenterDatabasev2.xsd).
//!
//! It reads the flat, time-indexed sample channels of one workout and emits
//! a TCX document with one biking activity containing one lap and one
//! trackpoint per sample.
//!
//! See [`convert`] for information on how to use this library.

mod model;
mod tcx;

use std::collections::HashMap;
use std::io::{self, Read};

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike, Utc};
use ordered_float::OrderedFloat;
use thiserror::Error;

use model::{ChannelDescriptor, WorkoutData, WorkoutExport};
use tcx::{Activity, Lap, Trackpoint, TrackpointExtension};

/// The exports carry a `DD/MM/YYYY` date.
const DATE_FORMAT: &str = "%d/%m/%Y";
/// Fixed offset subtracted together with the workout duration when
/// synthesizing the start time. Present in the vendor's own tooling;
/// looks like a timezone-compensation hack and is kept verbatim.
const START_TIME_SLACK: f64 = 3600.0;

/// Error returned from the [`convert`] function.
#[derive(Error, Debug)]
pub enum Error {
    /// Reading the workout JSON failed.
    #[error("reading workout JSON failed: {0}")]
    Json(#[from] serde_json::Error),
    /// TCX writing failed.
    #[error("writing TCX failed: {0}")]
    Xml(#[from] xml::writer::Error),
}

/// Read a MyWellness JSON export and write a TCX file.
///
/// A complete export is read from `source`. The converted workout is written
/// as a complete TCX document to `sink`.
///
/// If an error occurs, the function returns immediately. The `source` and
/// `sink` might have been modified in this case.
///
/// # Example
/// ```
/// # use mywellness_tcx_convert::convert;
/// #
/// let source = r#"{
///     "data": {
///         "date": "03/01/2024",
///         "duration": 2,
///         "analitics": {
///             "descriptor": [
///                 {"i": 0, "pr": {"name": "Power"}},
///                 {"i": 1, "pr": {"name": "HDistance"}}
///             ],
///             "samples": [
///                 {"t": 0, "vs": [180.0, 10.0]},
///                 {"t": 2, "vs": [190.0, 21.5]}
///             ],
///             "hr": [{"t": 2, "hr": 142}]
///         }
///     }
/// }"#;
/// let mut sink = vec![];
///
/// convert(source.as_bytes(), &mut sink).expect("conversion failed");
///
/// let tcx = String::from_utf8(sink).expect("TCX data is not valid UTF-8");
/// assert!(tcx.contains("<Id>2024-01-03T"));
/// assert!(tcx.contains("<Watts>190</Watts>"));
/// assert!(tcx.contains("<Value>142</Value>"));
/// assert!(tcx.contains("<DistanceMeters>21.50</DistanceMeters>"));
/// ```
pub fn convert(source: impl Read, sink: impl io::Write) -> Result<(), Error> {
    let export: WorkoutExport = serde_json::from_reader(source)?;
    let activity = build_activity(&export.data, Utc::now().naive_utc());
    tcx::write_document(&activity, sink)?;
    Ok(())
}

/// Derive the absolute start time of the workout.
///
/// The export only records a calendar date. The clock time is synthesized as
/// "now minus duration minus [`START_TIME_SLACK`]" and grafted onto the
/// recorded date; if the date does not parse, that synthesized instant is
/// used entirely, date included.
fn derive_start_time(date: &str, duration: f64, now: NaiveDateTime) -> NaiveDateTime {
    // Truncate to whole seconds so both paths format identically.
    let now = now.with_nanosecond(0).unwrap_or(now);
    let reference = now - seconds(duration + START_TIME_SLACK);

    match NaiveDate::parse_from_str(date, DATE_FORMAT) {
        Ok(date) => date.and_time(reference.time()),
        Err(_) => reference,
    }
}

/// Positions of the recognized metrics in a sample's value array.
#[derive(Debug, Default, PartialEq, Eq)]
struct Channels {
    power: Option<usize>,
    distance: Option<usize>,
    cadence: Option<usize>,
    speed: Option<usize>,
}

impl Channels {
    /// Look up the recognized metric names in the export's descriptor.
    ///
    /// The first descriptor entry carrying a name wins. A missing entry
    /// leaves that metric absent from every trackpoint.
    fn locate(descriptor: &[ChannelDescriptor]) -> Self {
        let find = |name| {
            descriptor
                .iter()
                .find(|channel| channel.pr.name == name)
                .map(|channel| channel.i)
        };
        Channels {
            power: find("Power"),
            distance: find("HDistance"),
            cadence: find("Rpm"),
            speed: find("Speed"),
        }
    }
}

/// Map the workout record to a TCX activity.
///
/// Samples are walked in input order. Distance is carried forward from the
/// previous sample when the `HDistance` channel is missing, and the lap
/// totals reflect the last processed sample, both matching the vendor's own
/// converter.
fn build_activity(data: &WorkoutData, now: NaiveDateTime) -> Activity {
    let start = derive_start_time(&data.date, data.duration, now);
    let channels = Channels::locate(&data.analitics.descriptor);

    // Heart rate joins the samples on the exact offset only.
    let heart_rates: HashMap<_, _> = data
        .analitics
        .hr
        .iter()
        .map(|entry| (OrderedFloat(entry.t), entry.hr))
        .collect();

    let mut running_distance = 0.0;
    let mut last_offset = 0.0;
    let mut trackpoints = Vec::with_capacity(data.analitics.samples.len());

    for sample in &data.analitics.samples {
        let metric = |index: Option<usize>| index.and_then(|i| sample.vs.get(i)).copied();

        let power = metric(channels.power);
        let cadence = metric(channels.cadence);
        let speed = metric(channels.speed);
        // HDistance is already cumulative; overwrite, never add.
        running_distance = metric(channels.distance).unwrap_or(running_distance);

        trackpoints.push(Trackpoint {
            time: start + seconds(sample.t),
            distance_meters: running_distance,
            heart_rate_bpm: heart_rates.get(&OrderedFloat(sample.t)).copied(),
            cadence,
            extension: (power.is_some() || speed.is_some()).then(|| TrackpointExtension {
                speed_kmh: speed,
                watts: power,
            }),
        });

        last_offset = sample.t;
    }

    Activity {
        id: start,
        lap: Lap {
            start_time: start,
            total_time_seconds: last_offset,
            distance_meters: running_distance,
            trackpoints,
        },
    }
}

/// A [`Duration`] from fractional seconds, rounded to milliseconds.
fn seconds(value: f64) -> Duration {
    Duration::milliseconds((value * 1000.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use crate::model::{Analytics, ChannelProperties, HeartRateSample, Sample};

    use super::*;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn start_time_takes_date_from_record_and_time_from_now() {
        // 12:00:00 minus 1800 s duration minus the 3600 s slack is 10:30:00.
        let start = derive_start_time("15/06/2023", 1800.0, noon());
        assert_eq!(
            start,
            NaiveDate::from_ymd_opt(2023, 6, 15)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap()
        );
    }

    #[test]
    fn start_time_falls_back_entirely_on_unparseable_date() {
        let start = derive_start_time("soon", 1800.0, noon());
        assert_eq!(
            start,
            NaiveDate::from_ymd_opt(2024, 1, 5)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap()
        );
    }

    #[test]
    fn start_time_ignores_subsecond_noise() {
        let now = noon().with_nanosecond(123_456_789).unwrap();
        assert_eq!(derive_start_time("15/06/2023", 0.0, now).nanosecond(), 0);
        assert_eq!(derive_start_time("soon", 0.0, now).nanosecond(), 0);
    }

    fn descriptor(names: &[&str]) -> Vec<ChannelDescriptor> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| ChannelDescriptor {
                i,
                pr: ChannelProperties {
                    name: name.to_string(),
                },
            })
            .collect()
    }

    #[test]
    fn locate_finds_each_channel_independently() {
        let channels = Channels::locate(&descriptor(&["Speed", "Custom", "HDistance"]));
        assert_eq!(
            channels,
            Channels {
                power: None,
                distance: Some(2),
                cadence: None,
                speed: Some(0),
            }
        );

        assert_eq!(Channels::locate(&[]), Channels::default());
    }

    fn data(descriptor: Vec<ChannelDescriptor>, samples: Vec<Sample>) -> WorkoutData {
        WorkoutData {
            date: "15/06/2023".to_string(),
            duration: 0.0,
            analitics: Analytics {
                descriptor,
                samples,
                hr: vec![],
            },
        }
    }

    #[test]
    fn distance_carries_forward_when_channel_value_is_missing() {
        let data = data(
            descriptor(&["HDistance"]),
            vec![
                Sample { t: 0.0, vs: vec![10.0] },
                Sample { t: 1.0, vs: vec![] },
            ],
        );

        let activity = build_activity(&data, noon());
        assert_eq!(activity.lap.trackpoints[0].distance_meters, 10.0);
        assert_eq!(activity.lap.trackpoints[1].distance_meters, 10.0);
        assert_eq!(activity.lap.distance_meters, 10.0);
    }

    #[test]
    fn lap_totals_come_from_the_last_sample() {
        let data = data(
            descriptor(&["HDistance"]),
            vec![
                Sample { t: 0.0, vs: vec![100.0] },
                Sample { t: 5.0, vs: vec![180.0] },
                Sample { t: 12.0, vs: vec![250.0] },
            ],
        );

        let activity = build_activity(&data, noon());
        assert_eq!(activity.lap.total_time_seconds, 12.0);
        assert_eq!(activity.lap.distance_meters, 250.0);
        assert_eq!(activity.lap.trackpoints.len(), 3);
    }

    #[test]
    fn empty_sample_list_yields_zero_totals() {
        let activity = build_activity(&data(vec![], vec![]), noon());
        assert_eq!(activity.lap.total_time_seconds, 0.0);
        assert_eq!(activity.lap.distance_meters, 0.0);
        assert!(activity.lap.trackpoints.is_empty());
    }

    #[test]
    fn heart_rate_requires_an_exact_offset_match() {
        let mut data = data(
            vec![],
            vec![
                Sample { t: 3.0, vs: vec![] },
                Sample { t: 4.0, vs: vec![] },
            ],
        );
        data.analitics.hr = vec![HeartRateSample { t: 3.0, hr: 140.0 }];

        let activity = build_activity(&data, noon());
        assert_eq!(activity.lap.trackpoints[0].heart_rate_bpm, Some(140.0));
        assert_eq!(activity.lap.trackpoints[1].heart_rate_bpm, None);
    }

    #[test]
    fn extension_is_absent_without_power_and_speed() {
        let data = data(
            descriptor(&["Rpm"]),
            vec![Sample { t: 0.0, vs: vec![90.0] }],
        );

        let activity = build_activity(&data, noon());
        let trackpoint = &activity.lap.trackpoints[0];
        assert_eq!(trackpoint.cadence, Some(90.0));
        assert!(trackpoint.extension.is_none());
    }
}
