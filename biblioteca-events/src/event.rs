//! Event definitions and handler traits

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// A published event.
///
/// Immutable once published. `event_type` discriminates the payload shape;
/// `timestamp` is milliseconds since the Unix epoch and `id` is unique within
/// the process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event type, e.g. `LOAN_CREATED`
    #[serde(rename = "type")]
    pub event_type: String,

    /// Event payload
    #[serde(default)]
    pub payload: Value,

    /// Publish time in ms since epoch
    pub timestamp: i64,

    /// Unique event ID
    pub id: String,
}

impl Event {
    /// Decode the payload into a typed structure.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.payload)
    }

    /// Check the event type.
    pub fn is(&self, event_type: impl AsRef<str>) -> bool {
        self.event_type == event_type.as_ref()
    }
}

/// An event before the bus assigns its `timestamp` and `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    /// Event type
    pub event_type: String,
    /// Event payload
    pub payload: Value,
}

impl NewEvent {
    /// Create an event with an arbitrary type.
    pub fn new(event_type: impl Into<String>, payload: Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
        }
    }

    /// Create a loan event.
    pub fn loan(kind: LoanEventType, payload: &LoanPayload) -> Self {
        Self::new(kind.as_str(), serde_json::to_value(payload).unwrap_or_default())
    }

    /// Create a system event; the type follows the payload level.
    pub fn system(payload: &SystemPayload) -> Self {
        Self::new(
            SystemEventType::for_level(payload.level).as_str(),
            serde_json::to_value(payload).unwrap_or_default(),
        )
    }

    /// Create a `<KIND>_<ACTION>` entity event.
    pub fn entity(kind: EntityKind, action: EntityAction, payload: Value) -> Self {
        Self::new(kind.event_type(action), payload)
    }

    pub(crate) fn stamp(self) -> Event {
        Event {
            event_type: self.event_type,
            payload: self.payload,
            timestamp: now_millis(),
            id: format!("evt_{}", Uuid::new_v4().simple()),
        }
    }
}

/// Current wall-clock time in ms since epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

// ============================================================================
// Event type sets
// ============================================================================

/// Loan event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoanEventType {
    Created,
    Returned,
    AnalysisStarted,
    AnalysisCompleted,
}

impl LoanEventType {
    pub const ALL: [LoanEventType; 4] = [
        Self::Created,
        Self::Returned,
        Self::AnalysisStarted,
        Self::AnalysisCompleted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "LOAN_CREATED",
            Self::Returned => "LOAN_RETURNED",
            Self::AnalysisStarted => "LOAN_ANALYSIS_STARTED",
            Self::AnalysisCompleted => "LOAN_ANALYSIS_COMPLETED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

/// System event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemEventType {
    Metrics,
    Error,
    Warning,
}

impl SystemEventType {
    pub const ALL: [SystemEventType; 3] = [Self::Metrics, Self::Error, Self::Warning];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Metrics => "SYSTEM_METRICS",
            Self::Error => "SYSTEM_ERROR",
            Self::Warning => "SYSTEM_WARNING",
        }
    }

    /// Informational messages travel as `SYSTEM_METRICS`.
    pub fn for_level(level: EventLevel) -> Self {
        match level {
            EventLevel::Info => Self::Metrics,
            EventLevel::Warning => Self::Warning,
            EventLevel::Error => Self::Error,
        }
    }
}

/// Entities managed through the admin client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Author,
    Book,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [Self::User, Self::Author, Self::Book];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Author => "AUTHOR",
            Self::Book => "BOOK",
        }
    }

    /// Event type for an action on this entity, e.g. `BOOK_DELETED`.
    pub fn event_type(&self, action: EntityAction) -> String {
        format!("{}_{}", self.as_str(), action.as_str())
    }
}

/// Mutations that produce entity events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityAction {
    Created,
    Updated,
    Deleted,
}

impl EntityAction {
    pub const ALL: [EntityAction; 3] = [Self::Created, Self::Updated, Self::Deleted];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Updated => "UPDATED",
            Self::Deleted => "DELETED",
        }
    }
}

macro_rules! impl_event_type_str {
    ($($ty:ty),*) => {
        $(
            impl AsRef<str> for $ty {
                fn as_ref(&self) -> &str {
                    self.as_str()
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

impl_event_type_str!(LoanEventType, SystemEventType);

// ============================================================================
// Payloads
// ============================================================================

/// Severity carried by system events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    Info,
    Warning,
    Error,
}

/// Payload of `SYSTEM_*` events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemPayload {
    pub message: String,
    pub level: EventLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl SystemPayload {
    pub fn new(message: impl Into<String>, level: EventLevel, data: Option<Value>) -> Self {
        Self {
            message: message.into(),
            level,
            data,
        }
    }
}

/// Payload of `LOAN_*` events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<LoanMetrics>,
}

/// Progress figures attached to loan analysis events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanMetrics {
    pub processed: u64,
    pub errors: u64,
    pub batch: u64,
}

// ============================================================================
// Handlers
// ============================================================================

/// Subscriber callback.
///
/// Handlers run on the bus dispatcher task, one event at a time, so they
/// should return quickly. Closures `Fn(&Event) -> Result<(), EventHandlerError>`
/// implement this trait.
pub trait EventHandler: Send + Sync {
    /// Handle one event.
    fn handle(&self, event: &Event) -> Result<(), EventHandlerError>;
}

impl<F> EventHandler for F
where
    F: Fn(&Event) -> Result<(), EventHandlerError> + Send + Sync,
{
    fn handle(&self, event: &Event) -> Result<(), EventHandlerError> {
        self(event)
    }
}

/// Event handler error
#[derive(Debug, thiserror::Error)]
pub enum EventHandlerError {
    #[error("Handler failed: {0}")]
    HandlerFailed(String),

    #[error("Event processing error: {0}")]
    ProcessingError(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}
