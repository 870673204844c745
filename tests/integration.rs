//! End-to-end tests for the passkeeper API core.
//!
//! Drives the gate directly (no HTTP listener) over the in-memory store,
//! with cheap hashing parameters so the suite stays fast.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use passkeeper::auth::{Hasher, TokenCodec};
use passkeeper::domain::App;
use passkeeper::error::ApiError;
use passkeeper::rpc::{ApiServer, ApiServerConfig, AuthGate, CallMeta};
use passkeeper::store::{AppStore, MemoryStore};
use serde_json::{json, Value};
use sha2::Sha256;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

const APP_ONE_SECRET: &str = "secret-one";
const APP_TWO_SECRET: &str = "secret-two";

struct TestEnv {
    store: Arc<MemoryStore>,
    gate: Arc<AuthGate>,
}

fn cheap_hasher() -> Hasher {
    Hasher::with_params(
        argon2::Params::MIN_M_COST,
        argon2::Params::MIN_T_COST,
        argon2::Params::MIN_P_COST,
    )
    .unwrap()
}

async fn test_env() -> TestEnv {
    let store = Arc::new(MemoryStore::new());
    store
        .put_app(App {
            id: 1,
            name: "web".to_string(),
            secret: APP_ONE_SECRET.to_string(),
        })
        .await
        .unwrap();
    store
        .put_app(App {
            id: 2,
            name: "mobile".to_string(),
            secret: APP_TWO_SECRET.to_string(),
        })
        .await
        .unwrap();

    let server = ApiServer::new(
        ApiServerConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            token_ttl: Duration::from_secs(3600),
        },
        store.clone(),
        store.clone(),
        store.clone(),
        cheap_hasher(),
    )
    .unwrap();

    TestEnv {
        store,
        gate: server.gate(),
    }
}

async fn call(
    gate: &AuthGate,
    method: &str,
    bearer: Option<&str>,
    payload: Value,
) -> Result<Value, ApiError> {
    let meta = CallMeta {
        method: method.to_string(),
        bearer: bearer.map(|t| t.to_string()),
    };
    gate.call(meta, payload).await
}

async fn register_and_login(env: &TestEnv, login: &str, password: &str) -> (Uuid, String) {
    let registered = call(
        &env.gate,
        "Register",
        None,
        json!({"login": login, "password": password}),
    )
    .await
    .unwrap();
    let user_id: Uuid =
        serde_json::from_value(registered["user_id"].clone()).unwrap();

    let logged_in = call(
        &env.gate,
        "Login",
        None,
        json!({"login": login, "password": password, "app_id": 1}),
    )
    .await
    .unwrap();
    let token = logged_in["token"].as_str().unwrap().to_string();

    (user_id, token)
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

fn sign_payload(payload_b64: &str, secret: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret).unwrap();
    mac.update(payload_b64.as_bytes());
    URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
}

fn forge_token(claims: &Value, secret: &[u8]) -> String {
    let payload_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).unwrap());
    let sig_b64 = sign_payload(&payload_b64, secret);
    format!("{}.{}", payload_b64, sig_b64)
}

#[tokio::test]
async fn test_register_login_and_verified_claims() {
    let env = test_env().await;
    let (user_id, token) = register_and_login(&env, "alice", "pw123").await;

    // The claims the server would act on come from the verified decode.
    let codec = TokenCodec::new(env.store.clone());
    let claims = codec.verify(&token).await.unwrap();
    assert_eq!(claims.uid, user_id);
    assert_eq!(claims.login, "alice");
    assert_eq!(claims.app_id, 1);
}

#[tokio::test]
async fn test_wrong_password_is_invalid_credentials() {
    let env = test_env().await;
    register_and_login(&env, "alice", "pw123").await;

    let err = call(
        &env.gate,
        "Login",
        None,
        json!({"login": "alice", "password": "wrongpw", "app_id": 1}),
    )
    .await
    .unwrap_err();
    assert_eq!(err, ApiError::InvalidCredentials);
}

#[tokio::test]
async fn test_unknown_login_is_indistinguishable_from_wrong_password() {
    let env = test_env().await;
    register_and_login(&env, "alice", "pw123").await;

    let wrong = call(
        &env.gate,
        "Login",
        None,
        json!({"login": "alice", "password": "wrongpw", "app_id": 1}),
    )
    .await
    .unwrap_err();
    let unknown = call(
        &env.gate,
        "Login",
        None,
        json!({"login": "nobody", "password": "pw123", "app_id": 1}),
    )
    .await
    .unwrap_err();

    assert_eq!(wrong, unknown);
    assert_eq!(wrong.to_string(), unknown.to_string());
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let env = test_env().await;
    register_and_login(&env, "alice", "pw123").await;

    let err = call(
        &env.gate,
        "Register",
        None,
        json!({"login": "alice", "password": "pw123"}),
    )
    .await
    .unwrap_err();
    assert_eq!(err, ApiError::CredentialConflict);
}

#[tokio::test]
async fn test_unprovisioned_app_is_not_a_credentials_error() {
    let env = test_env().await;
    register_and_login(&env, "alice", "pw123").await;

    let err = call(
        &env.gate,
        "Login",
        None,
        json!({"login": "alice", "password": "pw123", "app_id": 999}),
    )
    .await
    .unwrap_err();

    assert_eq!(err, ApiError::Internal);
    assert_ne!(err, ApiError::InvalidCredentials);
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let env = test_env().await;

    let err = call(
        &env.gate,
        "GetItem",
        None,
        json!({"id": Uuid::new_v4()}),
    )
    .await
    .unwrap_err();
    assert_eq!(err, ApiError::TokenInvalid);
}

#[tokio::test]
async fn test_resigned_token_fails_signature_check() {
    let env = test_env().await;
    let (_, token) = register_and_login(&env, "alice", "pw123").await;

    // Re-sign the original payload (which names app 1) with app 2's
    // secret. The gate resolves app 1's secret from the claims, so the
    // forged signature cannot verify.
    let payload_b64 = token.split('.').next().unwrap();
    let forged = format!(
        "{}.{}",
        payload_b64,
        sign_payload(payload_b64, APP_TWO_SECRET.as_bytes())
    );

    let err = call(&env.gate, "GetItems", Some(&forged), json!({}))
        .await
        .unwrap_err();
    assert_eq!(err, ApiError::SignatureMismatch);
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let env = test_env().await;
    let (user_id, _) = register_and_login(&env, "alice", "pw123").await;

    let now = unix_now();
    let expired = forge_token(
        &json!({
            "uid": user_id,
            "login": "alice",
            "app_id": 1,
            "iat": now - 7200,
            "exp": now - 3600,
        }),
        APP_ONE_SECRET.as_bytes(),
    );

    let err = call(&env.gate, "GetItems", Some(&expired), json!({}))
        .await
        .unwrap_err();
    assert_eq!(err, ApiError::TokenExpired);
}

#[tokio::test]
async fn test_token_for_unknown_tenant_rejected() {
    let env = test_env().await;
    let (user_id, _) = register_and_login(&env, "alice", "pw123").await;

    let now = unix_now();
    let stray = forge_token(
        &json!({
            "uid": user_id,
            "login": "alice",
            "app_id": 999,
            "iat": now,
            "exp": now + 3600,
        }),
        APP_ONE_SECRET.as_bytes(),
    );

    let err = call(&env.gate, "GetItems", Some(&stray), json!({}))
        .await
        .unwrap_err();
    assert_eq!(err, ApiError::TenantUnknown);
}

#[tokio::test]
async fn test_login_item_crud_with_injected_identity() {
    let env = test_env().await;
    let (user_id, token) = register_and_login(&env, "alice", "pw123").await;
    let folder_id = Uuid::new_v4();

    // No explicit user_id anywhere: the actor comes from the token.
    let created = call(
        &env.gate,
        "CreateLoginItem",
        Some(&token),
        json!({
            "item": {"name": "mail", "folder_id": folder_id},
            "login": "alice@example.com",
            "encrypted_password": "0badc0de",
        }),
    )
    .await
    .unwrap();
    let item_id: Uuid = serde_json::from_value(created["id"].clone()).unwrap();

    let fetched = call(
        &env.gate,
        "GetLoginItem",
        Some(&token),
        json!({"id": item_id}),
    )
    .await
    .unwrap();
    assert_eq!(fetched["login"], "alice@example.com");
    assert_eq!(fetched["name"], "mail");
    assert_eq!(
        serde_json::from_value::<Uuid>(fetched["user_id"].clone()).unwrap(),
        user_id
    );

    let by_folder = call(
        &env.gate,
        "GetItemsByFolder",
        Some(&token),
        json!({"folder_id": folder_id}),
    )
    .await
    .unwrap();
    assert_eq!(by_folder["items"].as_array().unwrap().len(), 1);

    call(
        &env.gate,
        "DeleteLoginItem",
        Some(&token),
        json!({"item_id": item_id}),
    )
    .await
    .unwrap();

    let listed = call(&env.gate, "GetItems", Some(&token), json!({}))
        .await
        .unwrap();
    assert!(listed["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_explicit_user_id_beats_injected_identity() {
    let env = test_env().await;
    let (alice_id, alice_token) = register_and_login(&env, "alice", "pw123").await;

    let registered = call(
        &env.gate,
        "Register",
        None,
        json!({"login": "bob", "password": "hunter2"}),
    )
    .await
    .unwrap();
    let bob_id: Uuid = serde_json::from_value(registered["user_id"].clone()).unwrap();

    // Alice's token, but the request names bob explicitly.
    let created = call(
        &env.gate,
        "CreateLoginItem",
        Some(&alice_token),
        json!({
            "item": {"name": "shared", "folder_id": Uuid::new_v4(), "user_id": bob_id},
            "login": "bob@example.com",
            "encrypted_password": "0badc0de",
        }),
    )
    .await
    .unwrap();
    let item_id: Uuid = serde_json::from_value(created["id"].clone()).unwrap();

    // The item belongs to bob, not to the token's subject.
    let bobs = call(
        &env.gate,
        "GetItem",
        Some(&alice_token),
        json!({"id": item_id, "user_id": bob_id}),
    )
    .await
    .unwrap();
    assert_eq!(
        serde_json::from_value::<Uuid>(bobs["user_id"].clone()).unwrap(),
        bob_id
    );

    let err = call(
        &env.gate,
        "GetItem",
        Some(&alice_token),
        json!({"id": item_id, "user_id": alice_id}),
    )
    .await
    .unwrap_err();
    assert_eq!(err, ApiError::Internal);
}

#[tokio::test]
async fn test_validation_errors_raised_at_the_boundary() {
    let env = test_env().await;
    let (_, token) = register_and_login(&env, "alice", "pw123").await;

    // Missing folder id.
    let err = call(
        &env.gate,
        "CreateLoginItem",
        Some(&token),
        json!({
            "item": {"name": "mail"},
            "login": "alice@example.com",
            "encrypted_password": "0badc0de",
        }),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));

    // Unknown method.
    let err = call(&env.gate, "DropAllItems", None, json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));

    // Empty credentials.
    let err = call(
        &env.gate,
        "Register",
        None,
        json!({"login": "", "password": "pw123"}),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}
