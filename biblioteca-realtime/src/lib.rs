//! # Biblioteca Realtime
//!
//! Reconnecting WebSocket relay for the Biblioteca admin client using
//! tokio-tungstenite.
//!
//! ## Features
//!
//! - Routes server-pushed `LOAN_*` and `SYSTEM_*` frames into the event bus
//! - Bounded reconnects at a fixed interval, with a terminal error event
//! - Outbound frames stamped with a timestamp and a `ws_` id
//! - Relay-local subscriptions by raw message type
//! - Observable connection status and WebSocket-style ready state
//!
//! ## Example
//!
//! ```rust,no_run
//! use biblioteca_events::EventBus;
//! use biblioteca_realtime::{RealtimeRelay, RelayConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let bus = EventBus::new();
//!     let relay = RealtimeRelay::new(RelayConfig::new("ws://localhost:8080"), bus.clone());
//!
//!     if let Err(e) = relay.connect().await {
//!         eprintln!("first attempt failed, retrying in the background: {e}");
//!     }
//!
//!     let _sub = relay.subscribe("LOAN_CREATED", |message| {
//!         println!("server pushed {}", message.payload);
//!     });
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod config;
mod error;
mod message;
mod relay;
mod status;

pub use config::RelayConfig;
pub use error::{RealtimeError, RealtimeResult};
pub use message::{RealtimeMessage, SYSTEM_MESSAGE};
pub use relay::{RealtimeRelay, RelaySubscription};
pub use status::{ReadyState, RelayStatus};
