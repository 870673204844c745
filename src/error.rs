//! Shared error taxonomy for the API surface.
//!
//! Module-local errors (`TokenError`, `AuthError`, `StorageError`) convert
//! into [`ApiError`] at the dispatch boundary; this is the only failure
//! vocabulary that crosses the wire.

use crate::auth::service::AuthError;
use crate::auth::token::TokenError;
use crate::store::StorageError;
use thiserror::Error;

/// Every failure a caller can observe.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Unknown login or wrong password. Deliberately undifferentiated.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Registration attempted with a login that already exists.
    #[error("login already taken")]
    CredentialConflict,

    /// The application named in a token's claims is not provisioned.
    #[error("unknown application")]
    TenantUnknown,

    /// Structurally broken or missing token.
    #[error("invalid token")]
    TokenInvalid,

    /// Token signature does not verify against the application secret.
    #[error("token signature mismatch")]
    SignatureMismatch,

    #[error("token expired")]
    TokenExpired,

    /// Missing or malformed request field, caught before business logic.
    #[error("{0}")]
    Validation(String),

    /// Infrastructure failure or recovered fault. Details stay in the logs.
    #[error("internal error")]
    Internal,
}

impl ApiError {
    /// Stable machine-readable code for wire responses.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidCredentials => "invalid_credentials",
            ApiError::CredentialConflict => "credential_conflict",
            ApiError::TenantUnknown => "tenant_unknown",
            ApiError::TokenInvalid => "token_invalid",
            ApiError::SignatureMismatch => "signature_mismatch",
            ApiError::TokenExpired => "token_expired",
            ApiError::Validation(_) => "validation",
            ApiError::Internal => "internal",
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Malformed => ApiError::TokenInvalid,
            TokenError::UnknownTenant(_) => ApiError::TenantUnknown,
            TokenError::SignatureMismatch => ApiError::SignatureMismatch,
            TokenError::Expired => ApiError::TokenExpired,
            TokenError::Registry(_) => ApiError::Internal,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::InvalidCredentials,
            AuthError::LoginTaken => ApiError::CredentialConflict,
            // Store and hashing failures are infrastructure problems; they
            // must not read as credential problems.
            AuthError::Store(_) | AuthError::Hash => ApiError::Internal,
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(_: StorageError) -> Self {
        ApiError::Internal
    }
}
