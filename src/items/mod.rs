//! Item and login-item services.
//!
//! Conventional CRUD orchestration over the record store. Authorization has
//! already happened by the time these run; they only ever see an owner id.

use crate::domain::{Item, LoginItem};
use crate::store::{ItemStore, StorageError};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Read access to item envelopes.
pub struct ItemService {
    store: Arc<dyn ItemStore>,
}

impl ItemService {
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self { store }
    }

    pub async fn get_item(&self, item_id: Uuid, user_id: Uuid) -> Result<Item, StorageError> {
        info!(item = %item_id, user = %user_id, "getting item");

        self.store.get_item(item_id, user_id).await.map_err(|e| {
            warn!(item = %item_id, error = %e, "failed to get item");
            e
        })
    }

    pub async fn get_items(&self, user_id: Uuid) -> Result<Vec<Item>, StorageError> {
        info!(user = %user_id, "getting items");

        self.store.get_items(user_id).await.map_err(|e| {
            warn!(user = %user_id, error = %e, "failed to get items");
            e
        })
    }

    pub async fn get_items_by_folder(
        &self,
        folder_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<Item>, StorageError> {
        info!(folder = %folder_id, user = %user_id, "getting items by folder");

        self.store
            .get_items_by_folder(folder_id, user_id)
            .await
            .map_err(|e| {
                warn!(folder = %folder_id, error = %e, "failed to get items by folder");
                e
            })
    }
}

/// Login-item CRUD.
pub struct LoginItemService {
    store: Arc<dyn ItemStore>,
}

impl LoginItemService {
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self { store }
    }

    /// Persist a login item and return its assigned id. The credential
    /// payload is opaque here and never logged.
    pub async fn create(&self, item: LoginItem) -> Result<Uuid, StorageError> {
        info!(user = %item.item.user_id, name = %item.item.name, "creating login item");

        self.store.create_login_item(item).await.map_err(|e| {
            warn!(error = %e, "failed to create login item");
            e
        })
    }

    pub async fn get(&self, item_id: Uuid, user_id: Uuid) -> Result<LoginItem, StorageError> {
        info!(item = %item_id, user = %user_id, "getting login item");

        self.store.get_login_item(item_id, user_id).await.map_err(|e| {
            warn!(item = %item_id, error = %e, "failed to get login item");
            e
        })
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<LoginItem>, StorageError> {
        info!(user = %user_id, "getting login items");

        self.store.get_login_items(user_id).await.map_err(|e| {
            warn!(user = %user_id, error = %e, "failed to get login items");
            e
        })
    }

    pub async fn delete(&self, user_id: Uuid, item_id: Uuid) -> Result<(), StorageError> {
        info!(item = %item_id, user = %user_id, "deleting login item");

        self.store.delete_login_item(user_id, item_id).await.map_err(|e| {
            warn!(item = %item_id, error = %e, "failed to delete login item");
            e
        })
    }
}
