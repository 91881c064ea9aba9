//! Progress reporting and cooperative cancellation for long searches.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

/// Snapshot of an exact search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    /// Share of the sample-size window scanned, in [0, 100]. Never decreases
    /// within one search.
    pub percent: f64,
    /// Next sample size to be scanned.
    pub n: u64,
    /// Sample size of the best feasible plan so far.
    pub best_n: Option<u64>,
}

#[derive(Debug, Error)]
#[error("Progress sink failed: {0}")]
pub struct SinkError(pub String);

/// Receiver of [`Progress`] events.
///
/// Reports must return promptly. An `Err` is logged and the search carries on.
pub trait ProgressSink {
    fn report(&mut self, progress: Progress) -> Result<(), SinkError>;
}

impl<F> ProgressSink for F
where
    F: FnMut(Progress),
{
    fn report(&mut self, progress: Progress) -> Result<(), SinkError> {
        self(progress);
        Ok(())
    }
}

/// Forwards progress over an unbounded channel, so reporting never blocks.
#[derive(Debug, Clone)]
pub struct ChannelSink(pub Sender<Progress>);

impl ProgressSink for ChannelSink {
    fn report(&mut self, progress: Progress) -> Result<(), SinkError> {
        self.0
            .send(progress)
            .map_err(|_| SinkError("progress receiver disconnected".into()))
    }
}

/// Shared cancellation flag.
///
/// Clones observe the same flag. The search polls it at its progress cadence.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
