//! Rendering of successful polls.
//!
//! The poll logic hands every successful [`PollReport`] to a [`ReadingSink`].
//! [`WriterSink`] is the stock sink: it formats the report with an
//! [`OutputFormatter`] and writes the result to any `io::Write`.

pub mod influxdb;
pub mod table;

use crate::reading::PollReport;
use std::io::{self, Write};

/// Trait for formatting a whole poll report into output text.
///
/// Implementations return the complete replacement rendering of the report;
/// nothing from a previous report is carried over.
pub trait OutputFormatter: Send + Sync {
    /// Format a report received from `address`.
    fn format(&self, report: &PollReport, address: &str) -> String;
}

/// Consumer of successful poll results. Not called on failure.
pub trait ReadingSink {
    fn on_readings(&mut self, address: &str, report: &PollReport) -> io::Result<()>;
}

/// Sink that writes formatted reports to a writer.
pub struct WriterSink<'a> {
    formatter: &'a dyn OutputFormatter,
    out: &'a mut dyn Write,
}

impl<'a> WriterSink<'a> {
    pub fn new(formatter: &'a dyn OutputFormatter, out: &'a mut dyn Write) -> Self {
        Self { formatter, out }
    }
}

impl ReadingSink for WriterSink<'_> {
    fn on_readings(&mut self, address: &str, report: &PollReport) -> io::Result<()> {
        let text = self.formatter.format(report, address);
        if text.is_empty() {
            return Ok(());
        }
        writeln!(self.out, "{text}")?;
        self.out.flush()
    }
}

/// Output format selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Format {
    /// Human-readable table, repopulated on every poll
    #[default]
    Table,
    /// InfluxDB line protocol, one line per reading
    Influxdb,
}
