//! Session token issuing and verification.
//!
//! Token format: `<payload_b64>.<sig_b64>` where the payload is the JSON
//! claims object and the signature is HMAC-SHA256 over the encoded payload,
//! keyed with the owning application's secret.
//!
//! Verification is a strict two-pass protocol. The application id is needed
//! to pick the verification secret, but it only becomes trustworthy once the
//! signature produced with that same secret has been checked. The first pass
//! therefore reads nothing except the application id, and the identity handed
//! to callers always comes from the second, signature-checked pass.

use crate::domain::{App, User};
use crate::store::{AppStore, StorageError};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("unknown application: {0}")]
    UnknownTenant(i64),

    #[error("token signature mismatch")]
    SignatureMismatch,

    #[error("token expired")]
    Expired,

    #[error("application lookup failed: {0}")]
    Registry(StorageError),
}

/// Claims carried by a session token.
///
/// Only the trusted pass of [`TokenCodec::verify`] produces this type;
/// absent or wrong-typed fields fail the decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the authenticated user's id.
    pub uid: Uuid,
    pub login: String,
    pub app_id: i64,
    /// Issued at, unix seconds.
    pub iat: i64,
    /// Expires at, unix seconds. Valid strictly before this instant.
    pub exp: i64,
}

/// The only value the untrusted pass may yield: which application's secret
/// to verify with. No other claim can leak out of this pass.
#[derive(Debug, Deserialize)]
struct TenantHint {
    app_id: i64,
}

impl TenantHint {
    fn peek(token: &str) -> Result<Self, TokenError> {
        let (payload_b64, _) = split_token(token)?;
        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| TokenError::Malformed)?;
        serde_json::from_slice(&payload).map_err(|_| TokenError::Malformed)
    }
}

/// Issues and verifies session tokens against per-application secrets.
pub struct TokenCodec {
    apps: Arc<dyn AppStore>,
}

impl TokenCodec {
    pub fn new(apps: Arc<dyn AppStore>) -> Self {
        Self { apps }
    }

    /// Issue a token for `user`, scoped to `app`, expiring after `ttl`.
    pub fn issue(&self, user: &User, app: &App, ttl: Duration) -> String {
        let now = unix_now();
        let claims = Claims {
            uid: user.id,
            login: user.login.clone(),
            app_id: app.id,
            iat: now,
            exp: now + ttl.as_secs() as i64,
        };
        encode(&claims, app.secret.as_bytes())
    }

    /// Verify a token and return its claims.
    ///
    /// Pass one reads the application id without checking the signature;
    /// pass two re-parses the same token requiring the signature to verify
    /// against the resolved application's secret and the expiry to be in
    /// the future. The returned claims come from pass two alone.
    pub async fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let hint = TenantHint::peek(token)?;

        let app = self.apps.app(hint.app_id).await.map_err(|e| match e {
            StorageError::NotFound(_) => TokenError::UnknownTenant(hint.app_id),
            other => TokenError::Registry(other),
        })?;

        decode_verified(token, app.secret.as_bytes(), unix_now())
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs() as i64
}

fn split_token(token: &str) -> Result<(&str, &str), TokenError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(TokenError::Malformed);
    }
    Ok((parts[0], parts[1]))
}

fn encode(claims: &Claims, secret: &[u8]) -> String {
    let payload_json = serde_json::to_vec(claims).expect("serialize claims");
    let payload_b64 = URL_SAFE_NO_PAD.encode(&payload_json);

    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(payload_b64.as_bytes());
    let sig_b64 = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    format!("{}.{}", payload_b64, sig_b64)
}

fn decode_verified(token: &str, secret: &[u8], now: i64) -> Result<Claims, TokenError> {
    let (payload_b64, sig_b64) = split_token(token)?;

    let sig = URL_SAFE_NO_PAD
        .decode(sig_b64)
        .map_err(|_| TokenError::Malformed)?;

    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(payload_b64.as_bytes());
    // Constant-time comparison.
    mac.verify_slice(&sig)
        .map_err(|_| TokenError::SignatureMismatch)?;

    let payload = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| TokenError::Malformed)?;
    let claims: Claims = serde_json::from_slice(&payload).map_err(|_| TokenError::Malformed)?;

    if now >= claims.exp {
        return Err(TokenError::Expired);
    }

    Ok(claims)
}
