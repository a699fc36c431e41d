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

//! TCX output document model and XML serialization.
//!
//! The document is built completely in memory and then written as a stream
//! of XML events. Only the elements the conversion actually produces are
//! modeled; this is not a general TCX library.

use std::io::Write;

use chrono::NaiveDateTime;
use xml::writer::{EmitterConfig, EventWriter, Result, XmlEvent};

/// Main namespace of the TCX v2 schema.
const TCX_NS: &str = "http://www.garmin.com/xmlschemas/TrainingCenterDatabase/v2";
/// Namespace for the `xsi:schemaLocation` attribute.
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
/// Value of the `xsi:schemaLocation` attribute on the root element.
const SCHEMA_LOCATION: &str = "http://www.garmin.com/xmlschemas/TrainingCenterDatabase/v2 \
     http://www.garmin.com/xmlschemas/TrainingCenterDatabasev2.xsd";
/// Namespace of the `TPX` trackpoint extension block.
const TPX_NS: &str = "http://www.garmin.com/xmlschemas/ActivityExtension/v2";

/// A single TCX activity. One is produced per conversion.
#[derive(Debug)]
pub struct Activity {
    /// Start timestamp, doubling as the activity `Id`.
    pub id: NaiveDateTime,
    pub lap: Lap,
}

/// The one lap of the activity, aggregating all trackpoints.
#[derive(Debug)]
pub struct Lap {
    pub start_time: NaiveDateTime,
    /// Offset of the last sample, not a sum of gaps.
    pub total_time_seconds: f64,
    /// Cumulative distance as of the last sample.
    pub distance_meters: f64,
    pub trackpoints: Vec<Trackpoint>,
}

/// One timestamped telemetry sample.
#[derive(Debug)]
pub struct Trackpoint {
    pub time: NaiveDateTime,
    pub distance_meters: f64,
    pub heart_rate_bpm: Option<f64>,
    pub cadence: Option<f64>,
    pub extension: Option<TrackpointExtension>,
}

/// The `TPX` extension block, present only when speed or power was sampled.
#[derive(Debug)]
pub struct TrackpointExtension {
    /// Speed in km/h; converted to m/s on output.
    pub speed_kmh: Option<f64>,
    pub watts: Option<f64>,
}

/// Write `activity` as a complete TCX document to `sink`.
///
/// The output carries an XML declaration and is UTF-8 encoded.
pub fn write_document(activity: &Activity, sink: impl Write) -> Result<()> {
    let mut writer = EmitterConfig::new()
        .perform_indent(true)
        .create_writer(sink);

    writer.write(
        XmlEvent::start_element("TrainingCenterDatabase")
            .default_ns(TCX_NS)
            .ns("xsi", XSI_NS)
            .attr("xsi:schemaLocation", SCHEMA_LOCATION),
    )?;
    writer.write(XmlEvent::start_element("Activities"))?;
    activity.write(&mut writer)?;
    writer.write(XmlEvent::end_element())?;
    writer.write(XmlEvent::end_element())?;
    Ok(())
}

impl Activity {
    fn write(&self, writer: &mut EventWriter<impl Write>) -> Result<()> {
        writer.write(XmlEvent::start_element("Activity").attr("Sport", "Biking"))?;
        simple_element(writer, "Id", &timestamp(&self.id))?;
        self.lap.write(writer)?;
        writer.write(XmlEvent::end_element())?;
        Ok(())
    }
}

impl Lap {
    fn write(&self, writer: &mut EventWriter<impl Write>) -> Result<()> {
        let start_time = timestamp(&self.start_time);
        writer.write(XmlEvent::start_element("Lap").attr("StartTime", &start_time))?;
        simple_element(writer, "TotalTimeSeconds", &decimal(self.total_time_seconds))?;
        simple_element(writer, "DistanceMeters", &decimal(self.distance_meters))?;
        // Never computed from the samples.
        simple_element(writer, "Calories", "0")?;
        simple_element(writer, "Intensity", "Active")?;

        writer.write(XmlEvent::start_element("Track"))?;
        for trackpoint in &self.trackpoints {
            trackpoint.write(writer)?;
        }
        writer.write(XmlEvent::end_element())?;

        writer.write(XmlEvent::end_element())?;
        Ok(())
    }
}

impl Trackpoint {
    fn write(&self, writer: &mut EventWriter<impl Write>) -> Result<()> {
        writer.write(XmlEvent::start_element("Trackpoint"))?;
        simple_element(writer, "Time", &timestamp(&self.time))?;
        simple_element(writer, "DistanceMeters", &decimal(self.distance_meters))?;

        if let Some(heart_rate) = self.heart_rate_bpm {
            writer.write(XmlEvent::start_element("HeartRateBpm"))?;
            simple_element(writer, "Value", &whole(heart_rate))?;
            writer.write(XmlEvent::end_element())?;
        }

        if let Some(cadence) = self.cadence {
            simple_element(writer, "Cadence", &whole(cadence))?;
        }

        if let Some(extension) = &self.extension {
            extension.write(writer)?;
        }

        writer.write(XmlEvent::end_element())?;
        Ok(())
    }
}

impl TrackpointExtension {
    fn write(&self, writer: &mut EventWriter<impl Write>) -> Result<()> {
        writer.write(XmlEvent::start_element("Extensions"))?;
        writer.write(XmlEvent::start_element("TPX").default_ns(TPX_NS))?;

        if let Some(speed) = self.speed_kmh {
            // The feed delivers km/h, TCX expects m/s.
            simple_element(writer, "Speed", &decimal(speed / 3.6))?;
        }
        if let Some(watts) = self.watts {
            simple_element(writer, "Watts", &whole(watts))?;
        }

        writer.write(XmlEvent::end_element())?;
        writer.write(XmlEvent::end_element())?;
        Ok(())
    }
}

/// Write a childless element containing only `content`.
fn simple_element(
    writer: &mut EventWriter<impl Write>,
    name: &str,
    content: &str,
) -> Result<()> {
    writer.write(XmlEvent::start_element(name))?;
    writer.write(XmlEvent::characters(content))?;
    writer.write(XmlEvent::end_element())?;
    Ok(())
}

/// ISO-8601 timestamp with the trailing `Z` the TCX schema expects.
fn timestamp(time: &NaiveDateTime) -> String {
    format!("{}Z", time.format("%Y-%m-%dT%H:%M:%S"))
}

/// Fixed two-decimal formatting for distances, durations, and speeds.
fn decimal(value: f64) -> String {
    format!("{value:.2}")
}

/// Integer formatting for bpm, rpm, and watts. Truncates toward zero.
fn whole(value: f64) -> String {
    format!("{}", value as i64)
}
