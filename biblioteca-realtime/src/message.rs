//! Frames exchanged with the realtime endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Message type used by [`RealtimeRelay::send_system_event`](crate::RealtimeRelay::send_system_event).
pub const SYSTEM_MESSAGE: &str = "SYSTEM_MESSAGE";

/// A JSON frame `{type, payload, timestamp, id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeMessage {
    /// Message type, e.g. `LOAN_CREATED`
    #[serde(rename = "type")]
    pub message_type: String,
    /// Message payload
    #[serde(default)]
    pub payload: Value,
    /// Send time in ms since epoch
    #[serde(default)]
    pub timestamp: i64,
    /// Message ID
    #[serde(default)]
    pub id: String,
}

impl RealtimeMessage {
    /// Outbound message stamped with the current time and a `ws_` id.
    pub fn outbound(message_type: impl Into<String>, payload: Value) -> Self {
        Self {
            message_type: message_type.into(),
            payload,
            timestamp: biblioteca_events::now_millis(),
            id: format!("ws_{}", Uuid::new_v4().simple()),
        }
    }

    /// Messages relayed to the bus as loan events.
    pub fn is_loan(&self) -> bool {
        self.message_type.starts_with("LOAN_")
    }

    /// Messages relayed to the bus as system events.
    pub fn is_system(&self) -> bool {
        self.message_type.starts_with("SYSTEM_")
    }
}
