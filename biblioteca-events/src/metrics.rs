//! Cumulative processing metrics and the stream that publishes them

use crate::event::now_millis;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// Cumulative counts of dispatched events.
///
/// `processed` and `errors` only ever grow during the life of a bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemMetrics {
    /// Events whose subscribers all succeeded
    pub processed: u64,
    /// Events with at least one failing subscriber
    pub errors: u64,
    /// Time of the last batch pass, ms since epoch
    pub last_update: i64,
}

impl SystemMetrics {
    /// Zero counts stamped with the current time.
    pub fn new() -> Self {
        Self {
            processed: 0,
            errors: 0,
            last_update: now_millis(),
        }
    }

    /// Total events accounted so far.
    pub fn total(&self) -> u64 {
        self.processed + self.errors
    }

    /// Fraction of accounted events that failed, 0.0 when nothing ran yet.
    pub fn error_rate(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.errors as f64 / total as f64,
        }
    }

    /// Processed events per second between `earlier` and `self`.
    ///
    /// Returns 0.0 when no time has elapsed between the two snapshots.
    pub fn throughput_since(&self, earlier: &SystemMetrics) -> f64 {
        let elapsed_ms = self.last_update - earlier.last_update;
        if elapsed_ms <= 0 {
            return 0.0;
        }
        let delta = self.processed.saturating_sub(earlier.processed);
        delta as f64 * 1000.0 / elapsed_ms as f64
    }

    pub(crate) fn absorb(&self, window: &WindowTally) -> Self {
        Self {
            processed: self.processed + window.processed,
            errors: self.errors + window.errors,
            last_update: now_millis(),
        }
    }
}

impl Default for SystemMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts for the batch window in progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowTally {
    pub processed: u64,
    pub errors: u64,
}

impl WindowTally {
    pub fn record(&mut self, succeeded: bool) {
        if succeeded {
            self.processed += 1;
        } else {
            self.errors += 1;
        }
    }

    pub fn len(&self) -> u64 {
        self.processed + self.errors
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Live view of the bus metrics.
///
/// Each stream starts at the current snapshot and yields one new snapshot per
/// closed, non-empty batch window. Obtain as many as needed from
/// [`EventBus::metrics`](crate::EventBus::metrics).
#[derive(Debug, Clone)]
pub struct MetricsStream {
    rx: watch::Receiver<SystemMetrics>,
}

impl MetricsStream {
    pub(crate) fn new(rx: watch::Receiver<SystemMetrics>) -> Self {
        Self { rx }
    }

    /// Latest snapshot without waiting.
    pub fn current(&self) -> SystemMetrics {
        *self.rx.borrow()
    }

    /// Wait for the next snapshot. `None` once the bus has shut down.
    pub async fn next(&mut self) -> Option<SystemMetrics> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }

    /// Convert into a `Stream` that yields the current snapshot first.
    pub fn into_stream(self) -> WatchStream<SystemMetrics> {
        WatchStream::new(self.rx)
    }
}
