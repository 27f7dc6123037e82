//! `thermistor-poller` library.
//!
//! The binary (`src/main.rs`) is responsible for logging setup, signals and
//! process exit codes. The retry/failover logic lives in [`crate::poll`] and
//! [`crate::scheduler`], where it runs against injected network, clock and
//! output collaborators.

pub mod address;
pub mod app;
pub mod client;
pub mod clock;
pub mod duration;
pub mod output;
pub mod poll;
pub mod reading;
pub mod scheduler;

#[cfg(test)]
mod test_utils;

// Re-export commonly used types at the crate root
pub use address::{AddressFile, AddressSource};
pub use client::{FetchError, Fetcher, HttpFetcher};
pub use clock::{Sleeper, TokioSleeper};
pub use output::influxdb::InfluxDbFormatter;
pub use output::table::TableFormatter;
pub use output::{OutputFormatter, ReadingSink, WriterSink};
pub use poll::{MAX_RETRIES, PollCycle, PollError, PollState, Transition};
pub use reading::{PollReport, Reading};
pub use scheduler::{EnabledFlag, Scheduler, StopReason, SweepEntry};
