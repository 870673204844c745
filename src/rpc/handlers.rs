//! Typed method dispatch and wire DTOs.
//!
//! Validation happens here, at the boundary, before any business logic
//! runs. Handlers that accept an optional explicit actor prefer it and
//! fall back to the gate-injected identity; those are the only two
//! sources of an actor id.

use crate::auth::service::AuthService;
use crate::domain::{Item, ItemKind, LoginItem};
use crate::error::ApiError;
use crate::items::{ItemService, LoginItemService};
use crate::rpc::context::CallContext;
use crate::rpc::gate::Dispatch;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
    pub app_id: i64,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct NewItem {
    pub name: String,
    #[serde(default = "default_kind")]
    pub kind: ItemKind,
    pub folder_id: Option<Uuid>,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub is_favorite: bool,
}

fn default_kind() -> ItemKind {
    ItemKind::Login
}

#[derive(Debug, Deserialize)]
pub struct CreateLoginItemRequest {
    pub item: NewItem,
    pub login: String,
    pub encrypted_password: String,
}

#[derive(Debug, Serialize)]
pub struct CreateLoginItemResponse {
    pub id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct GetItemRequest {
    pub id: Uuid,
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ListItemsRequest {
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct GetItemsByFolderRequest {
    pub folder_id: Uuid,
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteLoginItemRequest {
    pub item_id: Uuid,
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ItemsResponse {
    pub items: Vec<Item>,
}

#[derive(Debug, Serialize)]
pub struct LoginItemsResponse {
    pub items: Vec<LoginItem>,
}

#[derive(Debug, Serialize)]
pub struct DeleteLoginItemResponse {}

/// Routes method names to typed handlers.
pub struct ApiRouter {
    auth: Arc<AuthService>,
    items: Arc<ItemService>,
    login_items: Arc<LoginItemService>,
}

impl ApiRouter {
    pub fn new(
        auth: Arc<AuthService>,
        items: Arc<ItemService>,
        login_items: Arc<LoginItemService>,
    ) -> Self {
        Self {
            auth,
            items,
            login_items,
        }
    }

    async fn register(&self, payload: Value) -> Result<Value, ApiError> {
        let req: RegisterRequest = parse(payload)?;
        require(!req.login.is_empty(), "login is required")?;
        require(!req.password.is_empty(), "password is required")?;

        let user_id = self.auth.register(&req.login, &req.password).await?;
        ok(&RegisterResponse { user_id })
    }

    async fn login(&self, payload: Value) -> Result<Value, ApiError> {
        let req: LoginRequest = parse(payload)?;
        require(!req.login.is_empty(), "login is required")?;
        require(!req.password.is_empty(), "password is required")?;

        let token = self.auth.login(&req.login, &req.password, req.app_id).await?;
        ok(&LoginResponse { token })
    }

    async fn create_login_item(
        &self,
        ctx: CallContext,
        payload: Value,
    ) -> Result<Value, ApiError> {
        let req: CreateLoginItemRequest = parse(payload)?;
        require(!req.item.name.is_empty(), "item.name is required")?;
        require(!req.login.is_empty(), "login is required")?;
        require(
            !req.encrypted_password.is_empty(),
            "encrypted_password is required",
        )?;
        let folder_id = req
            .item
            .folder_id
            .ok_or_else(|| validation("item.folder_id is required"))?;
        let user_id = resolve_actor(&ctx, req.item.user_id)?;

        let item = LoginItem {
            item: Item {
                // The store assigns the real id.
                id: Uuid::nil(),
                kind: req.item.kind,
                name: req.item.name,
                folder_id,
                user_id,
                is_favorite: req.item.is_favorite,
            },
            login: req.login,
            encrypted_password: req.encrypted_password,
        };

        let id = self.login_items.create(item).await?;
        ok(&CreateLoginItemResponse { id })
    }

    async fn get_item(&self, ctx: CallContext, payload: Value) -> Result<Value, ApiError> {
        let req: GetItemRequest = parse(payload)?;
        let user_id = resolve_actor(&ctx, req.user_id)?;

        let item = self.items.get_item(req.id, user_id).await?;
        ok(&item)
    }

    async fn get_items(&self, ctx: CallContext, payload: Value) -> Result<Value, ApiError> {
        let req: ListItemsRequest = parse(payload)?;
        let user_id = resolve_actor(&ctx, req.user_id)?;

        let items = self.items.get_items(user_id).await?;
        ok(&ItemsResponse { items })
    }

    async fn get_items_by_folder(
        &self,
        ctx: CallContext,
        payload: Value,
    ) -> Result<Value, ApiError> {
        let req: GetItemsByFolderRequest = parse(payload)?;
        let user_id = resolve_actor(&ctx, req.user_id)?;

        let items = self.items.get_items_by_folder(req.folder_id, user_id).await?;
        ok(&ItemsResponse { items })
    }

    async fn get_login_item(&self, ctx: CallContext, payload: Value) -> Result<Value, ApiError> {
        let req: GetItemRequest = parse(payload)?;
        let user_id = resolve_actor(&ctx, req.user_id)?;

        let item = self.login_items.get(req.id, user_id).await?;
        ok(&item)
    }

    async fn get_login_items(&self, ctx: CallContext, payload: Value) -> Result<Value, ApiError> {
        let req: ListItemsRequest = parse(payload)?;
        let user_id = resolve_actor(&ctx, req.user_id)?;

        let items = self.login_items.list(user_id).await?;
        ok(&LoginItemsResponse { items })
    }

    async fn delete_login_item(
        &self,
        ctx: CallContext,
        payload: Value,
    ) -> Result<Value, ApiError> {
        let req: DeleteLoginItemRequest = parse(payload)?;
        let user_id = resolve_actor(&ctx, req.user_id)?;

        self.login_items.delete(user_id, req.item_id).await?;
        ok(&DeleteLoginItemResponse {})
    }
}

#[async_trait]
impl Dispatch for ApiRouter {
    async fn dispatch(
        &self,
        ctx: CallContext,
        method: &str,
        payload: Value,
    ) -> Result<Value, ApiError> {
        match method {
            "Register" => self.register(payload).await,
            "Login" => self.login(payload).await,
            "CreateLoginItem" => self.create_login_item(ctx, payload).await,
            "GetItem" => self.get_item(ctx, payload).await,
            "GetItems" => self.get_items(ctx, payload).await,
            "GetItemsByFolder" => self.get_items_by_folder(ctx, payload).await,
            "GetLoginItem" => self.get_login_item(ctx, payload).await,
            "GetLoginItems" => self.get_login_items(ctx, payload).await,
            "DeleteLoginItem" => self.delete_login_item(ctx, payload).await,
            other => Err(validation(&format!("unknown method: {}", other))),
        }
    }
}

/// Explicit request field wins; otherwise the identity injected from
/// verified claims. With neither, the call fails validation rather than
/// defaulting silently.
fn resolve_actor(ctx: &CallContext, explicit: Option<Uuid>) -> Result<Uuid, ApiError> {
    explicit
        .or_else(|| ctx.identity.map(|identity| identity.user_id))
        .ok_or_else(|| validation("user_id is required"))
}

fn parse<T: DeserializeOwned>(payload: Value) -> Result<T, ApiError> {
    serde_json::from_value(payload).map_err(|e| validation(&format!("invalid request: {}", e)))
}

fn ok<T: Serialize>(body: &T) -> Result<Value, ApiError> {
    serde_json::to_value(body).map_err(|_| ApiError::Internal)
}

fn validation(message: &str) -> ApiError {
    ApiError::Validation(message.to_string())
}

fn require(condition: bool, message: &str) -> Result<(), ApiError> {
    if condition {
        Ok(())
    } else {
        Err(validation(message))
    }
}
