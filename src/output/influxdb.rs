//! InfluxDB line protocol output formatter.

use crate::output::OutputFormatter;
use crate::reading::{PollReport, Reading};
use std::collections::BTreeMap;
use std::fmt;
use std::time::SystemTime;

/// Data point in InfluxDB line protocol
#[derive(Debug)]
pub struct DataPoint {
    pub measurement: String,
    pub tag_set: BTreeMap<&'static str, String>,
    pub field_set: BTreeMap<&'static str, f64>,
    pub timestamp: Option<SystemTime>,
}

/// Escape commas, spaces and equals signs in tag keys and values.
fn escape_tag(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, ',' | ' ' | '=') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl fmt::Display for DataPoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.measurement)?;
        for (key, value) in &self.tag_set {
            write!(f, ",{}={}", key, escape_tag(value))?;
        }

        let mut separator = " ";
        for (key, value) in &self.field_set {
            write!(f, "{separator}{key}={value}")?;
            separator = ",";
        }

        // Pre-epoch clocks are written without a timestamp and left to the server.
        if let Some(nanos) = self
            .timestamp
            .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
        {
            write!(f, " {}", nanos.as_nanos())?;
        }
        Ok(())
    }
}

/// InfluxDB line protocol formatter.
///
/// Emits one line per reading, tagged with the board address, segment and
/// thermistor number, and stamped with the local receive time of the poll.
pub struct InfluxDbFormatter {
    measurement_name: String,
}

impl InfluxDbFormatter {
    pub fn new(measurement_name: String) -> Self {
        Self { measurement_name }
    }

    fn to_data_point(&self, address: &str, reading: &Reading, at: SystemTime) -> DataPoint {
        let tag_set = BTreeMap::from([
            ("address", address.to_string()),
            ("segment", reading.segment_number.to_string()),
            ("thermistor", reading.thermistor_number.to_string()),
        ]);
        let field_set = BTreeMap::from([("temperature", reading.temperature)]);

        DataPoint {
            measurement: self.measurement_name.clone(),
            tag_set,
            field_set,
            timestamp: Some(at),
        }
    }
}

impl OutputFormatter for InfluxDbFormatter {
    fn format(&self, report: &PollReport, address: &str) -> String {
        report
            .readings
            .iter()
            .map(|r| {
                self.to_data_point(address, r, report.received_at)
                    .to_string()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn reading(segment: u32, thermistor: u32, temperature: f64) -> Reading {
        Reading {
            slot: 0,
            segment_number: segment,
            thermistor_number: thermistor,
            temperature,
        }
    }

    #[test]
    fn test_data_point_format() {
        let data_point = DataPoint {
            measurement: "test".to_string(),
            tag_set: BTreeMap::from([("name", "test".to_string()), ("zone", "a b".to_string())]),
            field_set: BTreeMap::from([("temperature", 32.0), ("delta", 0.2)]),
            timestamp: Some(SystemTime::UNIX_EPOCH + Duration::from_secs(1000000000)),
        };

        assert_eq!(
            data_point.to_string(),
            "test,name=test,zone=a\\ b delta=0.2,temperature=32 1000000000000000000"
        );
    }

    #[test]
    fn test_data_point_without_timestamp() {
        let data_point = DataPoint {
            measurement: "test".to_string(),
            tag_set: BTreeMap::new(),
            field_set: BTreeMap::from([("value", 1.5)]),
            timestamp: None,
        };
        assert_eq!(data_point.to_string(), "test value=1.5");
    }

    #[test]
    fn test_formatter_one_line_per_reading() {
        let formatter = InfluxDbFormatter::new("thermistor".to_string());
        let report = PollReport {
            readings: vec![reading(1, 2, 23.5), reading(1, 3, -1.25)],
            device_timestamp: "1".to_string(),
            count: 2,
            received_at: SystemTime::UNIX_EPOCH + Duration::from_secs(1000000000),
        };

        let output = formatter.format(&report, "10.0.0.7:80");
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(
            lines,
            vec![
                "thermistor,address=10.0.0.7:80,segment=1,thermistor=2 temperature=23.5 1000000000000000000",
                "thermistor,address=10.0.0.7:80,segment=1,thermistor=3 temperature=-1.25 1000000000000000000",
            ]
        );
    }

    #[test]
    fn test_formatter_empty_report() {
        let formatter = InfluxDbFormatter::new("thermistor".to_string());
        let report = PollReport {
            readings: vec![],
            device_timestamp: "1".to_string(),
            count: 0,
            received_at: SystemTime::UNIX_EPOCH,
        };
        assert_eq!(formatter.format(&report, "board"), "");
    }
}
