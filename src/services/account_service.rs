use std::sync::Arc;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::infrastructure::GraphStore;
use crate::models::{NewUser, User};

/// Registration and lookup of user nodes.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn GraphStore>,
}

impl AccountService {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Register a user. `Conflict` if the username is taken.
    pub async fn register(&self, user: NewUser) -> AppResult<User> {
        let created = self.store.create_user(user).await?;
        info!("Registered user {}", created.username);
        Ok(created)
    }

    pub async fn get_user(&self, username: &str) -> AppResult<User> {
        self.store
            .find_user(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", username)))
    }
}
