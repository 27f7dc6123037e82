//! Poll loop driver.
//!
//! [`Scheduler::start`] runs attempts back to back with a fixed pause
//! measured from the end of each attempt. The loop ends when the
//! [`EnabledFlag`] is cleared, either by the poll cycle itself (exhaustion,
//! empty address list) or from outside through a clone of the flag.

use crate::address::AddressSource;
use crate::client::Fetcher;
use crate::clock::Sleeper;
use crate::output::ReadingSink;
use crate::poll::{PollCycle, PollError, PollState, Transition};
use log::{error, info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Default pause between the end of one attempt and the start of the next.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(2000);

/// Default pause between addresses during [`Scheduler::test_all`].
pub const DEFAULT_SWEEP_PAUSE: Duration = Duration::from_millis(1000);

/// Shared on/off switch for a poll loop.
///
/// Clearing it never aborts an attempt already in flight; it only prevents
/// the next one from being scheduled.
#[derive(Debug, Clone, Default)]
pub struct EnabledFlag(Arc<AtomicBool>);

impl EnabledFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn disable(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Why a [`Scheduler::start`] run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The flag was cleared from outside
    Stopped,
    /// The only configured address failed too many times
    Exhausted,
    /// The address text held no addresses
    NoAddresses,
}

/// Outcome for one address of a diagnostic sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepEntry {
    pub address: String,
    pub result: Result<usize, PollError>,
}

/// Drives a [`PollCycle`] against live collaborators.
pub struct Scheduler<'a> {
    cycle: PollCycle,
    state: PollState,
    flag: EnabledFlag,
    interval: Duration,
    sweep_pause: Duration,
    addresses: &'a dyn AddressSource,
    fetcher: &'a dyn Fetcher,
    sleeper: &'a dyn Sleeper,
    sink: &'a mut dyn ReadingSink,
}

impl<'a> Scheduler<'a> {
    pub fn new(
        addresses: &'a dyn AddressSource,
        fetcher: &'a dyn Fetcher,
        sleeper: &'a dyn Sleeper,
        sink: &'a mut dyn ReadingSink,
    ) -> Self {
        Self {
            cycle: PollCycle::new(),
            state: PollState::stopped(),
            flag: EnabledFlag::new(),
            interval: DEFAULT_INTERVAL,
            sweep_pause: DEFAULT_SWEEP_PAUSE,
            addresses,
            fetcher,
            sleeper,
            sink,
        }
    }

    /// Use an externally owned flag so other tasks can stop the loop.
    pub fn with_flag(mut self, flag: EnabledFlag) -> Self {
        self.flag = flag;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_sweep_pause(mut self, pause: Duration) -> Self {
        self.sweep_pause = pause;
        self
    }

    /// A clone of the flag controlling this scheduler.
    pub fn flag(&self) -> EnabledFlag {
        self.flag.clone()
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// Reset the run state and poll until disabled.
    ///
    /// The first attempt runs immediately. Calling this while another run is
    /// active is the caller's mistake; it is not detected here.
    pub async fn start(&mut self) -> StopReason {
        self.flag.enable();
        self.state = PollState::started();
        info!("Polling started");

        loop {
            if !self.flag.is_enabled() {
                self.state.enabled = false;
                info!("Polling stopped");
                return StopReason::Stopped;
            }

            let transition = self
                .cycle
                .attempt(&mut self.state, self.addresses, self.fetcher, &mut *self.sink)
                .await;

            if !self.state.enabled {
                self.flag.disable();
                return match transition {
                    Transition::NoAddresses => StopReason::NoAddresses,
                    _ => StopReason::Exhausted,
                };
            }

            if self.flag.is_enabled() {
                self.sleeper.sleep(self.interval).await;
            }
        }
    }

    /// Disable the loop and reset the run state.
    ///
    /// A run currently inside [`Scheduler::start`] sees this through the
    /// shared flag once its in-flight attempt settles.
    pub fn stop(&mut self) {
        self.flag.disable();
        self.state = PollState::stopped();
    }

    /// One attempt against the first address.
    ///
    /// Leaves the enabled flag alone and schedules nothing.
    pub async fn poll_once(&mut self) -> Transition {
        info!("Polling thermistors once...");
        let enabled = self.state.enabled;
        self.state.index = 0;
        let transition = self
            .cycle
            .attempt(&mut self.state, self.addresses, self.fetcher, &mut *self.sink)
            .await;
        self.state.enabled = enabled;
        transition
    }

    /// Fetch every address once, in order, regardless of outcome.
    ///
    /// The retry counter is not involved. The cursor is left at 0. Clearing
    /// the flag mid-sweep skips the remaining addresses; the fetch in flight
    /// still completes.
    pub async fn test_all(&mut self) -> Vec<SweepEntry> {
        let list = self.addresses.addresses();
        if list.is_empty() {
            error!("{}", PollError::NoAddressesConfigured);
            return Vec::new();
        }

        let was_enabled = self.flag.is_enabled();
        self.flag.enable();

        info!("Testing {} IP addresses...", list.len());
        let mut entries = Vec::with_capacity(list.len());
        for (i, address) in list.iter().enumerate() {
            if !self.flag.is_enabled() {
                warn!("IP testing interrupted after {i}/{}", list.len());
                self.state.index = 0;
                return entries;
            }
            self.state.index = i;
            info!("Testing IP {}/{}: {address}", i + 1, list.len());

            let result = match self.fetcher.fetch(address).await {
                Ok(report) => {
                    info!("{address}: {} readings", report.readings.len());
                    if let Err(e) = self.sink.on_readings(address, &report) {
                        error!("failed to render readings from {address}: {e}");
                    }
                    Ok(report.readings.len())
                }
                Err(e) => {
                    warn!("{address}: {e}");
                    Err(PollError::from(e))
                }
            };
            entries.push(SweepEntry {
                address: address.clone(),
                result,
            });

            if i + 1 < list.len() && self.flag.is_enabled() {
                self.sleeper.sleep(self.sweep_pause).await;
            }
        }

        if !was_enabled {
            self.flag.disable();
        }
        self.state.index = 0;
        info!("IP testing complete");
        entries
    }
}
