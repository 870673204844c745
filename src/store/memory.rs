//! In-memory storage backend.
//!
//! Backs the test suite and `serve --in-memory`. Volatile by design.

use crate::domain::{App, Item, LoginItem, User};
use crate::store::{AppStore, ItemStore, StorageError, UserStore};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use uuid::Uuid;

/// Dashmap-backed store implementing all three collaborator traits.
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
    apps: DashMap<i64, App>,
    items: RwLock<Vec<LoginItem>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find(&self, login: &str) -> Result<User, StorageError> {
        self.users
            .get(login)
            .map(|u| u.clone())
            .ok_or_else(|| StorageError::NotFound(format!("user not found: {}", login)))
    }

    async fn create(&self, login: &str, pass_hash: &str) -> Result<Uuid, StorageError> {
        use dashmap::mapref::entry::Entry;

        match self.users.entry(login.to_string()) {
            Entry::Occupied(_) => Err(StorageError::Conflict(format!(
                "user already exists: {}",
                login
            ))),
            Entry::Vacant(slot) => {
                let id = Uuid::new_v4();
                slot.insert(User {
                    id,
                    login: login.to_string(),
                    pass_hash: pass_hash.to_string(),
                });
                Ok(id)
            }
        }
    }
}

#[async_trait]
impl AppStore for MemoryStore {
    async fn app(&self, id: i64) -> Result<App, StorageError> {
        self.apps
            .get(&id)
            .map(|a| a.clone())
            .ok_or_else(|| StorageError::NotFound(format!("application not found: {}", id)))
    }

    async fn put_app(&self, app: App) -> Result<(), StorageError> {
        self.apps.insert(app.id, app);
        Ok(())
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn create_login_item(&self, mut item: LoginItem) -> Result<Uuid, StorageError> {
        let mut items = self.items.write();

        if items
            .iter()
            .any(|i| i.item.user_id == item.item.user_id && i.item.name == item.item.name)
        {
            return Err(StorageError::Conflict(format!(
                "item already exists: {}",
                item.item.name
            )));
        }

        let id = Uuid::new_v4();
        item.item.id = id;
        items.push(item);
        Ok(id)
    }

    async fn get_item(&self, item_id: Uuid, user_id: Uuid) -> Result<Item, StorageError> {
        self.items
            .read()
            .iter()
            .find(|i| i.item.id == item_id && i.item.user_id == user_id)
            .map(|i| i.item.clone())
            .ok_or_else(|| StorageError::NotFound(format!("item not found: {}", item_id)))
    }

    async fn get_items(&self, user_id: Uuid) -> Result<Vec<Item>, StorageError> {
        Ok(self
            .items
            .read()
            .iter()
            .filter(|i| i.item.user_id == user_id)
            .map(|i| i.item.clone())
            .collect())
    }

    async fn get_items_by_folder(
        &self,
        folder_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<Item>, StorageError> {
        Ok(self
            .items
            .read()
            .iter()
            .filter(|i| i.item.user_id == user_id && i.item.folder_id == folder_id)
            .map(|i| i.item.clone())
            .collect())
    }

    async fn get_login_item(
        &self,
        item_id: Uuid,
        user_id: Uuid,
    ) -> Result<LoginItem, StorageError> {
        self.items
            .read()
            .iter()
            .find(|i| i.item.id == item_id && i.item.user_id == user_id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("item not found: {}", item_id)))
    }

    async fn get_login_items(&self, user_id: Uuid) -> Result<Vec<LoginItem>, StorageError> {
        Ok(self
            .items
            .read()
            .iter()
            .filter(|i| i.item.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_login_item(&self, user_id: Uuid, item_id: Uuid) -> Result<(), StorageError> {
        let mut items = self.items.write();
        let before = items.len();
        items.retain(|i| !(i.item.id == item_id && i.item.user_id == user_id));

        if items.len() == before {
            return Err(StorageError::NotFound(format!("item not found: {}", item_id)));
        }
        Ok(())
    }
}
