//! Connection lifecycle states.

use std::fmt;

/// Where the relay is in its connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayStatus {
    /// Not connected and not trying to be
    Disconnected,
    /// A connection attempt is in progress
    Connecting,
    /// Open and relaying frames
    Connected,
    /// Waiting before reconnect attempt `attempt`
    Reconnecting {
        /// 1-based attempt number
        attempt: u32,
    },
    /// Closing at the caller's request
    Closing,
    /// Reconnect attempts used up; stays here until `connect` is called
    Exhausted,
}

impl RelayStatus {
    /// WebSocket-style ready state of the underlying socket.
    pub fn ready_state(&self) -> ReadyState {
        match self {
            Self::Connecting => ReadyState::Connecting,
            Self::Connected => ReadyState::Open,
            Self::Closing => ReadyState::Closing,
            Self::Disconnected | Self::Reconnecting { .. } | Self::Exhausted => ReadyState::Closed,
        }
    }
}

impl fmt::Display for RelayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => f.write_str("disconnected"),
            Self::Connecting => f.write_str("connecting"),
            Self::Connected => f.write_str("connected"),
            Self::Reconnecting { attempt } => write!(f, "reconnecting (attempt {attempt})"),
            Self::Closing => f.write_str("closing"),
            Self::Exhausted => f.write_str("gave up reconnecting"),
        }
    }
}

/// Socket ready state, numbered as in the WebSocket API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReadyState {
    /// Connection is being established
    Connecting = 0,
    /// Connection is open and ready
    Open = 1,
    /// Connection is closing
    Closing = 2,
    /// Connection is closed
    Closed = 3,
}

impl ReadyState {
    /// Numeric value (0-3).
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_state_numbers() {
        assert_eq!(RelayStatus::Connecting.ready_state().as_u8(), 0);
        assert_eq!(RelayStatus::Connected.ready_state().as_u8(), 1);
        assert_eq!(RelayStatus::Closing.ready_state().as_u8(), 2);
        assert_eq!(RelayStatus::Reconnecting { attempt: 2 }.ready_state().as_u8(), 3);
        assert_eq!(RelayStatus::Exhausted.ready_state(), ReadyState::Closed);
    }
}
