//! `/users` endpoints.

use super::Resource;
use crate::models::{User, UserForm};
use crate::{HttpClient, IdempotencyKey, Result};

/// Library members.
#[derive(Clone)]
pub struct Users {
    resource: Resource,
}

impl Users {
    pub fn new(client: HttpClient) -> Self {
        Self {
            resource: Resource::new(client, "users"),
        }
    }

    /// `GET /users`
    pub async fn list(&self) -> Result<Vec<User>> {
        self.resource.list().await
    }

    /// `GET /users/{id}`
    pub async fn get(&self, id: i64) -> Result<User> {
        self.resource.get(id).await
    }

    /// `POST /users`
    pub async fn create(&self, form: &UserForm, key: Option<&IdempotencyKey>) -> Result<User> {
        self.resource.create(form, key).await
    }

    /// `PUT /users/{id}`
    pub async fn update(&self, id: i64, form: &UserForm) -> Result<User> {
        self.resource.update(id, form).await
    }

    /// `DELETE /users/{id}`
    pub async fn delete(&self, id: i64) -> Result<()> {
        self.resource.delete(id).await
    }
}
