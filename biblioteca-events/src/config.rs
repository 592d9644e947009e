//! Event bus configuration

use std::time::Duration;

/// Shortest batch window the dispatcher will schedule.
pub const MIN_WINDOW: Duration = Duration::from_millis(1);

/// Event bus configuration
///
/// Read by the dispatcher at every window boundary, so changes apply to the
/// next window rather than the one in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBusConfig {
    /// Optional cap on events per window; reaching it closes the window
    /// before `buffer_time` (0, the default, disables the cap)
    pub batch_size: usize,

    /// Length of a batch window
    pub buffer_time: Duration,

    /// Timeout for wrapped calls that report into this bus
    pub timeout: Duration,

    /// Retries for wrapped calls that report into this bus
    pub max_retries: u32,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            batch_size: 0,
            buffer_time: Duration::from_millis(1000),
            timeout: Duration::from_millis(5000),
            max_retries: 3,
        }
    }
}

impl EventBusConfig {
    /// Merge a partial update into this configuration.
    pub fn apply(&mut self, update: EventBusConfigUpdate) {
        if let Some(batch_size) = update.batch_size {
            self.batch_size = batch_size;
        }
        if let Some(buffer_time) = update.buffer_time {
            self.buffer_time = buffer_time;
        }
        if let Some(timeout) = update.timeout {
            self.timeout = timeout;
        }
        if let Some(max_retries) = update.max_retries {
            self.max_retries = max_retries;
        }
    }

    /// Window length actually scheduled by the dispatcher.
    pub fn window(&self) -> Duration {
        self.buffer_time.max(MIN_WINDOW)
    }
}

/// Partial configuration update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventBusConfigUpdate {
    pub batch_size: Option<usize>,
    pub buffer_time: Option<Duration>,
    pub timeout: Option<Duration>,
    pub max_retries: Option<u32>,
}

impl EventBusConfigUpdate {
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn buffer_time(mut self, buffer_time: Duration) -> Self {
        self.buffer_time = Some(buffer_time);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }
}
