//! Shared fakes for unit tests: scripted network, recording sink and sleeper.

use crate::address::AddressSource;
use crate::client::{FetchError, FetchFuture, Fetcher};
use crate::clock::{SleepFuture, Sleeper};
use crate::output::ReadingSink;
use crate::reading::{PollReport, Reading};
use std::collections::HashMap;
use std::io;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

/// A one-reading report: segment 1, thermistor 2, 23.5°C.
pub fn sample_report() -> PollReport {
    PollReport {
        readings: vec![Reading {
            slot: 1,
            segment_number: 1,
            thermistor_number: 2,
            temperature: 23.5,
        }],
        device_timestamp: "123456".to_string(),
        count: 2,
        received_at: SystemTime::UNIX_EPOCH,
    }
}

type Hook = Box<dyn Fn(&str) + Send + Sync>;

/// Fetcher with a fixed answer per address. Unknown addresses fail with a
/// transport error. Every call is recorded.
#[derive(Default)]
pub struct ScriptedFetcher {
    answers: HashMap<String, Result<PollReport, FetchError>>,
    calls: Mutex<Vec<String>>,
    on_fetch: Option<Hook>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn succeed(mut self, address: &str) -> Self {
        self.answers.insert(address.to_string(), Ok(sample_report()));
        self
    }

    pub fn fail(mut self, address: &str, error: FetchError) -> Self {
        self.answers.insert(address.to_string(), Err(error));
        self
    }

    /// Run `hook` inside every fetch, before the answer is returned.
    pub fn on_fetch(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_fetch = Some(Box::new(hook));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Fetcher for ScriptedFetcher {
    fn fetch<'a>(&'a self, address: &'a str) -> FetchFuture<'a> {
        self.calls.lock().unwrap().push(address.to_string());
        if let Some(hook) = &self.on_fetch {
            hook(address);
        }
        let answer = self
            .answers
            .get(address)
            .cloned()
            .unwrap_or_else(|| Err(FetchError::Transport("connection refused".to_string())));
        Box::pin(async move { answer })
    }
}

/// Sink that keeps every report it receives.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub reports: Vec<(String, PollReport)>,
}

impl ReadingSink for RecordingSink {
    fn on_readings(&mut self, address: &str, report: &PollReport) -> io::Result<()> {
        self.reports.push((address.to_string(), report.clone()));
        Ok(())
    }
}

/// Sleeper that returns immediately and records requested durations.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) -> SleepFuture<'_> {
        self.slept.lock().unwrap().push(duration);
        Box::pin(async {})
    }
}

/// Address text that tests can edit while a poll loop is running.
#[derive(Debug, Default)]
pub struct EditableAddresses(pub Mutex<String>);

impl EditableAddresses {
    pub fn new(text: &str) -> Self {
        Self(Mutex::new(text.to_string()))
    }

    pub fn set(&self, text: &str) {
        *self.0.lock().unwrap() = text.to_string();
    }
}

impl AddressSource for EditableAddresses {
    fn address_text(&self) -> String {
        self.0.lock().unwrap().clone()
    }
}
