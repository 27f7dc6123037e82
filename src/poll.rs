//! Retry and failover state machine for a single poll attempt.
//!
//! Each attempt targets the address under the cursor. A success resets the
//! retry counter. A failure increments it; after [`MAX_RETRIES`] consecutive
//! failures on one address the counter resets and the cursor moves to the
//! next address. If the list holds a single address, reaching the limit
//! disables polling instead.
//!
//! All state lives in [`PollState`], which the caller owns and passes in.

use crate::address::{self, AddressSource};
use crate::client::{FetchError, Fetcher};
use crate::output::ReadingSink;
use log::{debug, error, info, warn};
use std::time::SystemTime;
use thiserror::Error;

/// Consecutive failures tolerated per address before failing over.
pub const MAX_RETRIES: u32 = 3;

/// Errors that can end an attempt.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PollError {
    /// The address text resolved to zero entries
    #[error("no IP addresses configured")]
    NoAddressesConfigured,
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Cursor, retry counter and enabled flag of a poll run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollState {
    /// Cursor into the address list, wrapped modulo its length on lookup
    pub index: usize,
    /// Consecutive failures against the current address
    pub retry_count: u32,
    /// Whether further ticks may be scheduled
    pub enabled: bool,
}

impl PollState {
    /// State of a freshly (re)started run.
    pub fn started() -> Self {
        Self {
            index: 0,
            retry_count: 0,
            enabled: true,
        }
    }

    /// State of a stopped run.
    pub fn stopped() -> Self {
        Self {
            enabled: false,
            ..Self::started()
        }
    }
}

impl Default for PollState {
    fn default() -> Self {
        Self::stopped()
    }
}

/// Result of one attempt, named after the state it leaves the cycle in.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Report received and handed to the sink
    Succeeded { address: String, readings: usize },
    /// Failed; the next tick retries the same address
    FailedRetrying {
        address: String,
        retry_count: u32,
        error: FetchError,
    },
    /// Failed for the last time on `address`; the next tick targets `next`
    FailedAdvancing {
        address: String,
        next: Option<String>,
        error: FetchError,
    },
    /// The only configured address is exhausted; polling is disabled
    FailedTerminal { address: String, error: FetchError },
    /// Nothing to poll; polling is disabled without consuming a retry
    NoAddresses,
}

impl Transition {
    pub fn is_success(&self) -> bool {
        matches!(self, Transition::Succeeded { .. })
    }

    /// The error behind a failed transition.
    pub fn error(&self) -> Option<PollError> {
        match self {
            Transition::Succeeded { .. } => None,
            Transition::FailedRetrying { error, .. }
            | Transition::FailedAdvancing { error, .. }
            | Transition::FailedTerminal { error, .. } => Some(error.clone().into()),
            Transition::NoAddresses => Some(PollError::NoAddressesConfigured),
        }
    }
}

/// Executes attempts against a fetcher, rendering successes into a sink.
#[derive(Debug, Clone, Copy)]
pub struct PollCycle {
    max_retries: u32,
}

impl Default for PollCycle {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
        }
    }
}

impl PollCycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one attempt and apply its outcome to `state`.
    ///
    /// Never fails: every error is logged and folded into the returned
    /// [`Transition`].
    pub async fn attempt<A: AddressSource + ?Sized>(
        &self,
        state: &mut PollState,
        addresses: &A,
        fetcher: &dyn Fetcher,
        sink: &mut dyn ReadingSink,
    ) -> Transition {
        let list = addresses.addresses();
        let Some(address) = address::current(&list, state.index).map(String::from) else {
            error!("{}", PollError::NoAddressesConfigured);
            state.enabled = false;
            return Transition::NoAddresses;
        };

        info!("Fetching thermistor data from {address}...");
        match fetcher.fetch(&address).await {
            Ok(report) => {
                state.retry_count = 0;
                info!(
                    "Thermistor data from {address}: {} readings of {} thermistors, device timestamp {}",
                    report.readings.len(),
                    report.count,
                    report.device_timestamp
                );
                log_local_time(report.received_at);
                for r in &report.readings {
                    debug!(
                        "[{}] Segment: {}, Thermistor: {}, Temp: {}°C",
                        r.slot,
                        r.segment_number,
                        r.thermistor_number,
                        r.temperature
                    );
                }
                if let Err(e) = sink.on_readings(&address, &report) {
                    error!("failed to render readings from {address}: {e}");
                }
                Transition::Succeeded {
                    address,
                    readings: report.readings.len(),
                }
            }
            Err(fetch_error) => self.fail(state, addresses, address, fetch_error),
        }
    }

    fn fail<A: AddressSource + ?Sized>(
        &self,
        state: &mut PollState,
        addresses: &A,
        address: String,
        error: FetchError,
    ) -> Transition {
        warn!("Failed to fetch thermistor data from {address}: {error}");
        state.retry_count += 1;

        if state.retry_count < self.max_retries {
            info!(
                "Retry {}/{} for {address} on next poll cycle...",
                state.retry_count, self.max_retries
            );
            return Transition::FailedRetrying {
                address,
                retry_count: state.retry_count,
                error,
            };
        }

        error!(
            "Max retries ({}) reached for {address}. Moving to next IP.",
            self.max_retries
        );
        state.retry_count = 0;

        // The text may have been edited while the request was in flight.
        let list = addresses.addresses();
        if list.len() == 1 {
            error!("Only one IP available and it failed. Stopping.");
            state.enabled = false;
            return Transition::FailedTerminal { address, error };
        }

        if list.len() > 1 {
            state.index = address::advance(state.index, list.len());
        }
        let next = address::current(&list, state.index).map(String::from);
        if let Some(next) = &next {
            info!("Switching to next IP: {next}");
        }
        Transition::FailedAdvancing {
            address,
            next,
            error,
        }
    }
}

/// RFC 3339 rendering of the local receive time, to the second.
fn local_time(received_at: SystemTime) -> Option<String> {
    // humantime panics on times before the epoch
    received_at.duration_since(SystemTime::UNIX_EPOCH).ok()?;
    Some(humantime::format_rfc3339_seconds(received_at).to_string())
}

fn log_local_time(received_at: SystemTime) {
    if let Some(time) = local_time(received_at) {
        info!("Local time: {time}");
    }
}
