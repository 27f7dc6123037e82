//! Sleep abstraction for the poll loop.
//!
//! The scheduler never calls `tokio::time::sleep` directly so tests can
//! substitute a sleeper that returns immediately and records what it was
//! asked to wait.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Future returned by [`Sleeper::sleep`].
pub type SleepFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration) -> SleepFuture<'_>;
}

/// Sleeper backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> SleepFuture<'_> {
        Box::pin(tokio::time::sleep(duration))
    }
}
