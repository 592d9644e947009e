//! Transient user-visible alerts.
//!
//! At most one alert is shown at a time. A newer alert replaces the current
//! one, and each alert clears itself after [`DEFAULT_DISMISS_AFTER`] unless
//! something newer has taken its place.

use biblioteca_client::ClientError;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

/// How long an alert stays visible.
pub const DEFAULT_DISMISS_AFTER: Duration = Duration::from_millis(3500);

/// Alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKind {
    Success,
    Error,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertKind::Success => write!(f, "success"),
            AlertKind::Error => write!(f, "error"),
        }
    }
}

/// A single alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    id: u64,
    kind: AlertKind,
    message: String,
}

impl Alert {
    pub fn kind(&self) -> AlertKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_error(&self) -> bool {
        self.kind == AlertKind::Error
    }
}

/// Holds the currently visible alert.
///
/// Cloning is cheap and every clone shows the same alert. Showing an alert
/// spawns its dismiss timer, so it must be called inside a Tokio runtime.
#[derive(Clone)]
pub struct AlertCenter {
    inner: Arc<AlertInner>,
}

struct AlertInner {
    current: watch::Sender<Option<Alert>>,
    next_id: AtomicU64,
    dismiss_after: Duration,
}

impl AlertCenter {
    pub fn new() -> Self {
        Self::with_dismiss_after(DEFAULT_DISMISS_AFTER)
    }

    pub fn with_dismiss_after(dismiss_after: Duration) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            inner: Arc::new(AlertInner {
                current,
                next_id: AtomicU64::new(1),
                dismiss_after,
            }),
        }
    }

    /// Show a success alert.
    pub fn success(&self, message: impl Into<String>) -> Alert {
        self.show(AlertKind::Success, message.into())
    }

    /// Show an error alert.
    pub fn error(&self, message: impl Into<String>) -> Alert {
        self.show(AlertKind::Error, message.into())
    }

    /// Show an error alert for a failed API call.
    ///
    /// The backend's message is used when it sent one, otherwise `fallback`.
    pub fn report(&self, error: &ClientError, fallback: &str) -> Alert {
        warn!(error = %error, "reporting failed operation");
        self.error(error.user_message(fallback))
    }

    /// Clear the current alert.
    pub fn dismiss(&self) {
        self.inner.current.send_if_modified(|current| current.take().is_some());
    }

    /// The alert currently shown, if any.
    pub fn current(&self) -> Option<Alert> {
        self.inner.current.borrow().clone()
    }

    /// Observe alert changes.
    pub fn watch(&self) -> watch::Receiver<Option<Alert>> {
        self.inner.current.subscribe()
    }

    fn show(&self, kind: AlertKind, message: String) -> Alert {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let alert = Alert { id, kind, message };
        self.inner.current.send_replace(Some(alert.clone()));
        debug!(id, %kind, "alert shown");

        let inner = Arc::downgrade(&self.inner);
        let after = self.inner.dismiss_after;
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            if let Some(inner) = inner.upgrade() {
                inner.current.send_if_modified(|current| {
                    if current.as_ref().is_some_and(|a| a.id == id) {
                        *current = None;
                        true
                    } else {
                        false
                    }
                });
            }
        });

        alert
    }
}

impl Default for AlertCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AlertCenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlertCenter")
            .field("current", &self.current())
            .field("dismiss_after", &self.inner.dismiss_after)
            .finish()
    }
}
