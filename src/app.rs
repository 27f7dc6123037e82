//! Core application runner for `thermistor-poller`.
//!
//! Decoupled from process setup (logging, signals, exit codes) so the whole
//! run can be tested with a fake network and writers.

use crate::address::{AddressFile, AddressSource};
use crate::client::{DEFAULT_TIMEOUT, FetchError, Fetcher};
use crate::clock::Sleeper;
use crate::duration::parse_duration;
use crate::output::influxdb::InfluxDbFormatter;
use crate::output::table::TableFormatter;
use crate::output::{Format, OutputFormatter, WriterSink};
use crate::poll::Transition;
use crate::scheduler::{EnabledFlag, Scheduler, StopReason, SweepEntry};
use clap::{ArgGroup, Parser};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Configuration for a run.
#[derive(Parser, Debug, Clone)]
#[command(author, about, version)]
#[command(group(
    ArgGroup::new("source")
        .required(true)
        .multiple(false)
        .args(["ips", "ips_file"])
))]
pub struct Options {
    /// Comma-separated device addresses, polled in order with failover.
    /// Format: --ips 192.168.1.50,192.168.1.51:8080
    #[arg(long)]
    pub ips: Option<String>,

    /// File holding the address list, re-read before every poll.
    /// Commas and newlines both separate addresses.
    #[arg(long, value_name = "PATH")]
    pub ips_file: Option<PathBuf>,

    /// Pause after each poll before the next one.
    /// Accepts duration with suffix: 2s, 500ms, 1m.
    #[arg(long, default_value = "2s", value_parser = parse_duration)]
    pub interval: Duration,

    /// Pause between addresses during --test-all.
    #[arg(long, default_value = "1s", value_parser = parse_duration)]
    pub sweep_pause: Duration,

    /// HTTP request timeout.
    #[arg(long, default_value = "5s", value_parser = parse_duration)]
    pub timeout: Duration,

    /// Poll the first address once and exit.
    #[arg(long, conflicts_with = "test_all")]
    pub once: bool,

    /// Poll every address once, in order, and exit.
    #[arg(long)]
    pub test_all: bool,

    /// Output format for readings.
    #[arg(long, default_value_t, value_enum)]
    pub format: Format,

    /// The name of the measurement in InfluxDB line protocol.
    #[arg(long, default_value = "thermistor")]
    pub influxdb_measurement: String,

    /// Verbose output, log every reading and request
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            ips: None,
            ips_file: None,
            interval: crate::scheduler::DEFAULT_INTERVAL,
            sweep_pause: crate::scheduler::DEFAULT_SWEEP_PAUSE,
            timeout: DEFAULT_TIMEOUT,
            once: false,
            test_all: false,
            format: Format::Table,
            influxdb_measurement: "thermistor".to_string(),
            verbose: false,
        }
    }
}

impl Options {
    /// The configured address source.
    ///
    /// The command line accepts exactly one of `--ips` and `--ips-file`.
    /// Options built in code without either poll an empty list.
    pub fn address_source(&self) -> Box<dyn AddressSource> {
        match &self.ips_file {
            Some(path) => Box::new(AddressFile::new(path)),
            None => Box::new(self.ips.clone().unwrap_or_default()),
        }
    }

    fn formatter(&self) -> Box<dyn OutputFormatter> {
        match self.format {
            Format::Table => Box::new(TableFormatter::new()),
            Format::Influxdb => Box::new(InfluxDbFormatter::new(self.influxdb_measurement.clone())),
        }
    }
}

/// Errors returned by the application runner.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// What a run did, by mode.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Polled(StopReason),
    Once(Transition),
    Sweep(Vec<SweepEntry>),
}

impl RunOutcome {
    /// Whether the process should exit successfully.
    ///
    /// A sweep succeeds only if every address answered.
    pub fn is_success(&self) -> bool {
        match self {
            RunOutcome::Polled(reason) => *reason == StopReason::Stopped,
            RunOutcome::Once(transition) => transition.is_success(),
            RunOutcome::Sweep(entries) => {
                !entries.is_empty() && entries.iter().all(|e| e.result.is_ok())
            }
        }
    }
}

fn write_sweep_summary(entries: &[SweepEntry], err: &mut dyn Write) -> io::Result<()> {
    for entry in entries {
        match &entry.result {
            Ok(readings) => writeln!(err, "{}: ok ({readings} readings)", entry.address)?,
            Err(e) => writeln!(err, "{}: failed ({e})", entry.address)?,
        }
    }
    Ok(())
}

/// Run in the mode selected by `options`, rendering readings to `out`.
///
/// The sweep summary goes to `err` so `out` stays machine-readable.
/// `flag` stops a continuous run once the in-flight attempt settles.
pub async fn run_with_io(
    options: Options,
    fetcher: &dyn Fetcher,
    sleeper: &dyn Sleeper,
    flag: EnabledFlag,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<RunOutcome, RunError> {
    let addresses = options.address_source();
    let formatter = options.formatter();
    let mut sink = WriterSink::new(formatter.as_ref(), out);

    let mut scheduler = Scheduler::new(addresses.as_ref(), fetcher, sleeper, &mut sink)
        .with_flag(flag)
        .with_interval(options.interval)
        .with_sweep_pause(options.sweep_pause);

    let outcome = if options.once {
        RunOutcome::Once(scheduler.poll_once().await)
    } else if options.test_all {
        let entries = scheduler.test_all().await;
        write_sweep_summary(&entries, err)?;
        RunOutcome::Sweep(entries)
    } else {
        RunOutcome::Polled(scheduler.start().await)
    };

    Ok(outcome)
}
