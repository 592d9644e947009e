//! In-process event bus for the Biblioteca admin client
//!
//! Components publish loan, entity and system events; subscribers register
//! per event type and receive events in publish order. Delivery outcomes are
//! accounted in time/count-bounded batch windows and exposed as a live
//! [`SystemMetrics`] stream.
//!
//! ## Features
//!
//! - **Event Bus** - Publish/subscribe keyed by event type
//! - **Isolation** - A failing or panicking subscriber never blocks the others
//! - **Windowed metrics** - Cumulative processed/error counts per batch window
//! - **Runtime config** - Batch size and window length adjustable while running
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use biblioteca_events::*;
//!
//! #[tokio::main]
//! async fn main() {
//!     let bus = EventBus::new();
//!
//!     let _sub = bus.subscribe(LoanEventType::Created, |event: &Event| {
//!         let loan: LoanPayload = event.payload_as()?;
//!         println!("loan {:?} created", loan.loan_id);
//!         Ok(())
//!     });
//!
//!     bus.publish_loan(
//!         LoanEventType::Created,
//!         &LoanPayload { loan_id: Some(1), ..Default::default() },
//!     );
//!
//!     let mut metrics = bus.metrics();
//!     if let Some(snapshot) = metrics.next().await {
//!         println!("processed {}", snapshot.processed);
//!     }
//! }
//! ```
//!
//! ## Configuration
//!
//! ```rust,ignore
//! use std::time::Duration;
//!
//! let bus = EventBus::builder()
//!     .batch_size(50)
//!     .buffer_time(Duration::from_millis(250))
//!     .build();
//!
//! bus.update_config(EventBusConfigUpdate::default().batch_size(0));
//! ```

pub mod bus;
pub mod config;
pub mod event;
pub mod metrics;

pub use bus::*;
pub use config::*;
pub use event::*;
pub use metrics::*;

/// Prelude for common imports.
pub mod prelude {
    pub use crate::bus::{EventBus, Subscription};
    pub use crate::config::{EventBusConfig, EventBusConfigUpdate};
    pub use crate::event::{
        EntityAction, EntityKind, Event, EventHandler, EventHandlerError, EventLevel,
        LoanEventType, LoanPayload, NewEvent, SystemEventType, SystemPayload,
    };
    pub use crate::metrics::{MetricsStream, SystemMetrics};
}
