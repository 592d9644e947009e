//! Typed services for the REST resources.
//!
//! Each service is a thin pass-through over [`HttpClient`]: one method per
//! endpoint, no retries. Wrap calls with [`ReactiveApi`](crate::ReactiveApi)
//! for delay/timeout/retry and bus telemetry.

mod authors;
mod books;
mod loans;
mod users;

pub use authors::Authors;
pub use books::Books;
pub use loans::Loans;
pub use users::Users;

use crate::{HttpClient, IdempotencyKey, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// CRUD calls shared by the collection resources.
#[derive(Clone)]
pub(crate) struct Resource {
    client: HttpClient,
    path: &'static str,
}

impl Resource {
    pub(crate) fn new(client: HttpClient, path: &'static str) -> Self {
        Self { client, path }
    }

    fn item(&self, id: i64) -> String {
        format!("{}/{}", self.path, id)
    }

    pub(crate) async fn list<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.client.get(self.path).send_json().await
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, id: i64) -> Result<T> {
        self.client.get(self.item(id)).send_json().await
    }

    pub(crate) async fn create<F, T>(&self, form: &F, key: Option<&IdempotencyKey>) -> Result<T>
    where
        F: Serialize,
        T: DeserializeOwned,
    {
        self.client
            .post(self.path)
            .idempotency_key(key)
            .json(form)
            .send_json()
            .await
    }

    pub(crate) async fn update<F, T>(&self, id: i64, form: &F) -> Result<T>
    where
        F: Serialize,
        T: DeserializeOwned,
    {
        self.client.put(self.item(id)).json(form).send_json().await
    }

    pub(crate) async fn delete(&self, id: i64) -> Result<()> {
        self.client.delete(self.item(id)).send_empty().await
    }

    pub(crate) fn client(&self) -> &HttpClient {
        &self.client
    }
}
