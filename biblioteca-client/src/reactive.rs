//! Delay/timeout/retry wrapper that reports outcomes into the event bus.

use crate::{ClientError, Result};
use biblioteca_events::{EventBus, EventBusConfig, EventLevel, now_millis};
use parking_lot::RwLock;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// How wrapped calls are run.
///
/// `timeout` and `max_retries` left at `None` follow the bus configuration,
/// which is read again at the start of every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallPolicy {
    /// Wait before every attempt.
    pub delay: Duration,
    /// Limit for a single attempt.
    pub timeout: Option<Duration>,
    /// Attempts after the first failure.
    pub max_retries: Option<u32>,
    /// Publish an info event on success.
    pub enable_metrics: bool,
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(100),
            timeout: None,
            max_retries: None,
            enable_metrics: true,
        }
    }
}

impl CallPolicy {
    /// Pin the attempt timeout instead of following the bus.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Pin the retry count instead of following the bus.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Settings a call started under `bus` runs with.
    pub fn resolve(&self, bus: &EventBusConfig) -> ResolvedPolicy {
        ResolvedPolicy {
            delay: self.delay,
            timeout: self.timeout.unwrap_or(bus.timeout),
            max_retries: self.max_retries.unwrap_or(bus.max_retries),
            enable_metrics: self.enable_metrics,
        }
    }
}

/// A [`CallPolicy`] with the bus defaults filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPolicy {
    pub delay: Duration,
    pub timeout: Duration,
    pub max_retries: u32,
    pub enable_metrics: bool,
}

impl ResolvedPolicy {
    /// Total attempts a failing call makes.
    pub fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Runs async operations under a [`CallPolicy`].
///
/// The policy is resolved against the bus configuration once per call, so
/// `EventBus::update_config` reaches the next call without touching the
/// caller. Every attempt waits `delay` and is bounded by `timeout`; any failure,
/// timeouts included, is retried until `max_retries` is used up. The final
/// outcome is published on the bus as a `SYSTEM_METRICS` (success) or
/// `SYSTEM_ERROR` (failure) event.
#[derive(Clone)]
pub struct ReactiveCaller {
    bus: EventBus,
    policy: Arc<RwLock<CallPolicy>>,
}

impl ReactiveCaller {
    pub fn new(bus: EventBus, policy: CallPolicy) -> Self {
        Self {
            bus,
            policy: Arc::new(RwLock::new(policy)),
        }
    }

    /// Current policy.
    pub fn policy(&self) -> CallPolicy {
        self.policy.read().clone()
    }

    /// Policy the next call would run with.
    pub fn effective_policy(&self) -> ResolvedPolicy {
        self.policy.read().resolve(&self.bus.config())
    }

    /// Replace the policy. Calls already running keep the old one.
    pub fn update_policy(&self, policy: CallPolicy) {
        *self.policy.write() = policy;
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Run `operation`, creating a fresh future for each attempt.
    pub async fn call<T, F, Fut>(&self, name: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let policy = self.effective_policy();
        let attempts = policy.attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            tokio::time::sleep(policy.delay).await;

            let outcome = match tokio::time::timeout(policy.timeout, operation()).await {
                Ok(outcome) => outcome,
                Err(_) => Err(ClientError::Timeout(policy.timeout)),
            };

            match outcome {
                Ok(value) => {
                    debug!(operation = name, attempt, "Operation completed");
                    if policy.enable_metrics {
                        self.bus.publish_system(
                            format!("Operation {name} completed"),
                            EventLevel::Info,
                            Some(json!({
                                "operation": name,
                                "attempts": attempt,
                                "timestamp": now_millis(),
                            })),
                        );
                    }
                    return Ok(value);
                }
                Err(e) if attempt < attempts => {
                    warn!(operation = name, attempt, error = %e, "Operation failed, retrying");
                }
                Err(e) => {
                    warn!(operation = name, attempts, error = %e, "Operation failed");
                    self.bus.publish_system(
                        format!("Error in operation {name}"),
                        EventLevel::Error,
                        Some(json!({
                            "operation": name,
                            "error": e.to_string(),
                            "attempts": attempt,
                            "timestamp": now_millis(),
                        })),
                    );
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_fields_follow_bus_config() {
        let config = EventBusConfig {
            timeout: Duration::from_secs(2),
            max_retries: 1,
            ..Default::default()
        };
        let policy = CallPolicy::default().resolve(&config);

        assert_eq!(policy.timeout, Duration::from_secs(2));
        assert_eq!(policy.attempts(), 2);
        assert_eq!(policy.delay, Duration::from_millis(100));
        assert!(policy.enable_metrics);
    }

    #[test]
    fn test_pinned_fields_win_over_bus_config() {
        let policy = CallPolicy::default()
            .max_retries(0)
            .timeout(Duration::from_millis(300))
            .resolve(&EventBusConfig::default());

        assert_eq!(policy.attempts(), 1);
        assert_eq!(policy.timeout, Duration::from_millis(300));
    }
}
