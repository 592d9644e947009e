//! `/loans` endpoints.
//!
//! Loans are never updated or deleted; they are closed with
//! [`Loans::return_loan`].

use super::Resource;
use crate::models::{Loan, LoanForm};
use crate::{HttpClient, IdempotencyKey, Result};

/// Book loans.
#[derive(Clone)]
pub struct Loans {
    resource: Resource,
}

impl Loans {
    pub fn new(client: HttpClient) -> Self {
        Self {
            resource: Resource::new(client, "loans"),
        }
    }

    /// `GET /loans`
    pub async fn list(&self) -> Result<Vec<Loan>> {
        self.resource.list().await
    }

    /// `GET /loans/{id}`
    pub async fn get(&self, id: i64) -> Result<Loan> {
        self.resource.get(id).await
    }

    /// `POST /loans`
    pub async fn create(&self, form: &LoanForm, key: Option<&IdempotencyKey>) -> Result<Loan> {
        self.resource.create(form, key).await
    }

    /// `POST /loans/{id}/return`
    pub async fn return_loan(&self, id: i64, key: Option<&IdempotencyKey>) -> Result<Loan> {
        self.resource
            .client()
            .post(format!("loans/{id}/return"))
            .idempotency_key(key)
            .send_json()
            .await
    }
}
