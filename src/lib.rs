//! # Biblioteca
//!
//! Client side of a library administration system. The crate wires together
//! the in-process event bus, the REST client with its reactive call wrapper,
//! and the realtime WebSocket relay behind one application root.
//!
//! ## Crates
//!
//! - [`events`]: event bus with windowed processing metrics
//! - [`client`]: REST services and the reactive call wrapper
//! - [`realtime`]: reconnecting WebSocket relay into the bus
//! - [`config`]: `BIBLIOTECA_*` environment configuration
//! - [`log`]: tracing subscriber bootstrap
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use biblioteca::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     biblioteca::log::init();
//!
//!     let app = AdminApp::from_env()?;
//!     let _sub = app.bus().subscribe("LOAN_CREATED", |event: &Event| {
//!         println!("new loan: {}", event.payload);
//!         Ok(())
//!     });
//!
//!     let loan = app.api().create_loan(&LoanForm { user_id: 1, book_id: 7 }).await?;
//!     app.alerts().success(format!("Loan {} created", loan.id));
//!
//!     app.shutdown().await;
//!     Ok(())
//! }
//! ```

mod alerts;
mod app;
mod error;

pub use alerts::{Alert, AlertCenter, AlertKind, DEFAULT_DISMISS_AFTER};
pub use app::AdminApp;
pub use error::{AppError, Result};

pub use biblioteca_client as client;
pub use biblioteca_config as config;
pub use biblioteca_events as events;
pub use biblioteca_log as log;
pub use biblioteca_realtime as realtime;

/// Prelude for common imports.
pub mod prelude {
    pub use crate::alerts::{Alert, AlertCenter, AlertKind};
    pub use crate::app::AdminApp;
    pub use crate::error::{AppError, Result};
    pub use biblioteca_client::models::*;
    pub use biblioteca_client::{CallPolicy, ClientError, HttpClient, ReactiveApi};
    pub use biblioteca_config::AppConfig;
    pub use biblioteca_events::prelude::*;
    pub use biblioteca_realtime::{RealtimeMessage, RealtimeRelay, RelayConfig, RelayStatus};
}
