//! `/books` endpoints.

use super::Resource;
use crate::models::{Book, BookForm};
use crate::{HttpClient, IdempotencyKey, Result};

/// Catalogue.
#[derive(Clone)]
pub struct Books {
    resource: Resource,
}

impl Books {
    pub fn new(client: HttpClient) -> Self {
        Self {
            resource: Resource::new(client, "books"),
        }
    }

    /// `GET /books`
    pub async fn list(&self) -> Result<Vec<Book>> {
        self.resource.list().await
    }

    /// `GET /books/{id}`
    pub async fn get(&self, id: i64) -> Result<Book> {
        self.resource.get(id).await
    }

    /// `POST /books`
    pub async fn create(&self, form: &BookForm, key: Option<&IdempotencyKey>) -> Result<Book> {
        self.resource.create(form, key).await
    }

    /// `PUT /books/{id}`
    pub async fn update(&self, id: i64, form: &BookForm) -> Result<Book> {
        self.resource.update(id, form).await
    }

    /// `DELETE /books/{id}`
    pub async fn delete(&self, id: i64) -> Result<()> {
        self.resource.delete(id).await
    }
}
