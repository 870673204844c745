//! Storage backends for passkeeper
//!
//! - Postgres: durable storage for users, applications, and records
//! - Memory: dashmap-backed store for tests and single-process runs
//!
//! These are the subsystem's external collaborators; nothing here makes
//! authorization decisions.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{PostgresConfig, PostgresStore};

use crate::domain::{App, Item, LoginItem, User};
pub use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Storage errors
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    Conflict(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Credential store: persists and looks up users by login.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a user by login.
    async fn find(&self, login: &str) -> Result<User, StorageError>;

    /// Persist a new user, returns the assigned id. A duplicate login is a
    /// [`StorageError::Conflict`].
    async fn create(&self, login: &str, pass_hash: &str) -> Result<Uuid, StorageError>;
}

/// Tenant registry: resolves an application id to its signing secret.
#[async_trait]
pub trait AppStore: Send + Sync {
    /// Resolve an application by id.
    async fn app(&self, id: i64) -> Result<App, StorageError>;

    /// Provision or replace an application. Out-of-band only; no API route
    /// writes through this.
    async fn put_app(&self, app: App) -> Result<(), StorageError>;
}

/// Record store: login-item CRUD. Not security-relevant.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Persist a login item. The store assigns the item id and returns it.
    async fn create_login_item(&self, item: LoginItem) -> Result<Uuid, StorageError>;

    /// Get one item envelope owned by `user_id`.
    async fn get_item(&self, item_id: Uuid, user_id: Uuid) -> Result<Item, StorageError>;

    /// All item envelopes owned by `user_id`.
    async fn get_items(&self, user_id: Uuid) -> Result<Vec<Item>, StorageError>;

    /// Item envelopes in one folder, owned by `user_id`.
    async fn get_items_by_folder(
        &self,
        folder_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<Item>, StorageError>;

    /// Get one login item owned by `user_id`.
    async fn get_login_item(&self, item_id: Uuid, user_id: Uuid)
        -> Result<LoginItem, StorageError>;

    /// All login items owned by `user_id`.
    async fn get_login_items(&self, user_id: Uuid) -> Result<Vec<LoginItem>, StorageError>;

    /// Delete a login item owned by `user_id`.
    async fn delete_login_item(&self, user_id: Uuid, item_id: Uuid) -> Result<(), StorageError>;
}
