//! Plain-text table output.

use crate::output::OutputFormatter;
use crate::reading::PollReport;
use std::fmt::Write;

const HEADER: [&str; 3] = ["Segment", "Thermistor", "Temperature"];

/// Renders each report as a fresh table: title, header, one row per reading.
#[derive(Debug, Default, Clone, Copy)]
pub struct TableFormatter;

impl TableFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Temperature cell text, e.g. `23.5°C`.
    pub fn temperature_cell(celsius: f64) -> String {
        format!("{celsius}°C")
    }
}

impl OutputFormatter for TableFormatter {
    fn format(&self, report: &PollReport, address: &str) -> String {
        let rows: Vec<[String; 3]> = report
            .readings
            .iter()
            .map(|r| {
                [
                    r.segment_number.to_string(),
                    r.thermistor_number.to_string(),
                    Self::temperature_cell(r.temperature),
                ]
            })
            .collect();

        let mut widths = HEADER.map(|h| h.chars().count());
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = writeln!(
            out,
            "=== {address} ({} thermistors, device time {}) ===",
            report.count, report.device_timestamp
        );
        let _ = write!(
            out,
            "{:<w0$}  {:<w1$}  {:<w2$}",
            HEADER[0],
            HEADER[1],
            HEADER[2],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2]
        );
        for row in &rows {
            // Pad by characters, not bytes: "°" is two bytes.
            let _ = write!(out, "\n{}", pad(&row[0], widths[0]));
            let _ = write!(out, "  {}", pad(&row[1], widths[1]));
            let _ = write!(out, "  {}", row[2]);
        }
        out
    }
}

fn pad(cell: &str, width: usize) -> String {
    let len = cell.chars().count();
    format!("{cell}{}", " ".repeat(width.saturating_sub(len)))
}
