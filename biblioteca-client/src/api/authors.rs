//! `/authors` endpoints.

use super::Resource;
use crate::models::{Author, AuthorForm};
use crate::{HttpClient, IdempotencyKey, Result};

/// Book authors.
#[derive(Clone)]
pub struct Authors {
    resource: Resource,
}

impl Authors {
    pub fn new(client: HttpClient) -> Self {
        Self {
            resource: Resource::new(client, "authors"),
        }
    }

    /// `GET /authors`
    pub async fn list(&self) -> Result<Vec<Author>> {
        self.resource.list().await
    }

    /// `GET /authors/{id}`
    pub async fn get(&self, id: i64) -> Result<Author> {
        self.resource.get(id).await
    }

    /// `POST /authors`
    pub async fn create(&self, form: &AuthorForm, key: Option<&IdempotencyKey>) -> Result<Author> {
        self.resource.create(form, key).await
    }

    /// `PUT /authors/{id}`
    pub async fn update(&self, id: i64, form: &AuthorForm) -> Result<Author> {
        self.resource.update(id, form).await
    }

    /// `DELETE /authors/{id}`
    pub async fn delete(&self, id: i64) -> Result<()> {
        self.resource.delete(id).await
    }
}
