//! HTTP transport surface.
//!
//! One POST route per method plus a health probe. The transport's only
//! jobs are extracting the method name and bearer token and mapping the
//! error taxonomy onto status codes; everything else happens behind the
//! gate.

use crate::auth::password::Hasher;
use crate::auth::service::{AuthError, AuthService};
use crate::auth::token::TokenCodec;
use crate::error::ApiError;
use crate::items::{ItemService, LoginItemService};
use crate::rpc::context::CallMeta;
use crate::rpc::gate::AuthGate;
use crate::rpc::handlers::ApiRouter;
use crate::store::{AppStore, ItemStore, UserStore};
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Shared state for HTTP handlers
#[derive(Clone)]
pub struct HttpState {
    pub gate: Arc<AuthGate>,
}

/// Create the HTTP router
pub fn create_router(state: HttpState) -> Router {
    Router::new()
        .route("/v1/{method}", post(call_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn call_handler(
    State(state): State<HttpState>,
    Path(method): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Response {
    let meta = CallMeta {
        method,
        bearer: bearer_token(&headers),
    };

    match state.gate.call(meta, payload).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => error_response(e),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.to_string())
}

fn error_response(err: ApiError) -> Response {
    let status = match &err {
        ApiError::Validation(_) => StatusCode::BAD_REQUEST,
        ApiError::InvalidCredentials
        | ApiError::TenantUnknown
        | ApiError::TokenInvalid
        | ApiError::SignatureMismatch
        | ApiError::TokenExpired => StatusCode::UNAUTHORIZED,
        ApiError::CredentialConflict => StatusCode::CONFLICT,
        ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let body = json!({
        "error": err.code(),
        "message": err.to_string(),
    });

    (status, Json(body)).into_response()
}

/// API server configuration
pub struct ApiServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,
    /// Session token lifetime
    pub token_ttl: Duration,
}

/// The passkeeper API server: wires stores, services, and the gate.
pub struct ApiServer {
    config: ApiServerConfig,
    gate: Arc<AuthGate>,
}

impl ApiServer {
    pub fn new(
        config: ApiServerConfig,
        users: Arc<dyn UserStore>,
        apps: Arc<dyn AppStore>,
        items: Arc<dyn ItemStore>,
        hasher: Hasher,
    ) -> Result<Self, AuthError> {
        let codec = Arc::new(TokenCodec::new(apps.clone()));
        let auth = Arc::new(AuthService::new(
            users,
            apps,
            codec.clone(),
            hasher,
            config.token_ttl,
        )?);
        let item_service = Arc::new(ItemService::new(items.clone()));
        let login_item_service = Arc::new(LoginItemService::new(items));
        let router = Arc::new(ApiRouter::new(auth, item_service, login_item_service));
        let gate = Arc::new(AuthGate::new(codec, router));

        Ok(Self { config, gate })
    }

    /// The gate, for driving calls without going through HTTP.
    pub fn gate(&self) -> Arc<AuthGate> {
        self.gate.clone()
    }

    /// Run the server
    pub async fn run(&self) -> anyhow::Result<()> {
        let app = create_router(HttpState {
            gate: self.gate.clone(),
        });

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;
        info!(addr = %self.config.bind_addr, "passkeeper API listening");

        axum::serve(listener, app).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer tok-123".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("tok-123".to_string()));

        headers.insert(header::AUTHORIZATION, "Basic dXNlcg==".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }
}
