//! # Biblioteca Client
//!
//! REST client for the library administration API, and the reactive call
//! wrapper that runs API calls with a delay, a timeout and fixed-count
//! retries while reporting outcomes on the event bus.
//!
//! ## Features
//!
//! - **Typed services**: `Users`, `Authors`, `Books`, `Loans`
//! - **Backend errors**: API error documents surface as readable messages
//! - **Idempotent writes**: creates and returns carry an `Idempotency-Key`
//! - **Telemetry**: success/failure of wrapped calls published as system events
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use biblioteca_client::{HttpClient, Loans};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HttpClient::with_base_url("http://localhost:8080/api")?;
//!     let loans = Loans::new(client);
//!
//!     for loan in loans.list().await? {
//!         println!("{} -> {}", loan.book_title, loan.user_name);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Wrapped calls
//!
//! ```rust,ignore
//! use biblioteca_client::{CallPolicy, ReactiveApi};
//! use biblioteca_client::models::LoanForm;
//!
//! let api = ReactiveApi::new(client, bus.clone(), CallPolicy::default());
//!
//! // publishes "Operation CREATE_LOAN completed" and LOAN_CREATED on success
//! let loan = api.create_loan(&LoanForm { user_id: 1, book_id: 7 }).await?;
//! ```

mod api;
mod client;
mod config;
mod error;
pub mod models;
mod reactive;
mod reactive_api;
mod request;
mod response;

pub use api::{Authors, Books, Loans, Users};
pub use client::HttpClient;
pub use config::{DEFAULT_BASE_URL, HttpClientConfig};
pub use error::{ClientError, Result};
pub use reactive::{CallPolicy, ReactiveCaller, ResolvedPolicy};
pub use reactive_api::ReactiveApi;
pub use request::{IDEMPOTENCY_KEY_HEADER, IdempotencyKey, RequestBuilder};
pub use response::Response;

// Re-export common types
pub use http::{Method, StatusCode};
pub use url::Url;

/// Prelude for common imports.
pub mod prelude {
    pub use crate::api::{Authors, Books, Loans, Users};
    pub use crate::client::HttpClient;
    pub use crate::config::HttpClientConfig;
    pub use crate::error::{ClientError, Result};
    pub use crate::models::*;
    pub use crate::reactive::{CallPolicy, ReactiveCaller, ResolvedPolicy};
    pub use crate::reactive_api::ReactiveApi;
    pub use crate::request::IdempotencyKey;
}
