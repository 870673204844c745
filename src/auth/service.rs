//! User registration and login.

use crate::auth::password::Hasher;
use crate::auth::token::TokenCodec;
use crate::domain::User;
use crate::store::{AppStore, StorageError, UserStore};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

/// Verified on the unknown-login path so that path costs the same as a
/// wrong password against a real digest.
const DECOY_PASSWORD: &str = "passkeeper-decoy-credential";

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown login and wrong password collapse into this one variant;
    /// callers cannot tell them apart.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("login already taken")]
    LoginTaken,

    #[error("storage failure: {0}")]
    Store(#[from] StorageError),

    #[error("password hashing failed")]
    Hash,
}

/// Registers users and authenticates logins, producing session tokens.
///
/// Stateless over its injected dependencies; safe to share across calls.
pub struct AuthService {
    users: Arc<dyn UserStore>,
    apps: Arc<dyn AppStore>,
    codec: Arc<TokenCodec>,
    hasher: Hasher,
    token_ttl: Duration,
    decoy_digest: String,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        apps: Arc<dyn AppStore>,
        codec: Arc<TokenCodec>,
        hasher: Hasher,
        token_ttl: Duration,
    ) -> Result<Self, AuthError> {
        let decoy_digest = hasher.hash(DECOY_PASSWORD).map_err(|_| AuthError::Hash)?;
        Ok(Self {
            users,
            apps,
            codec,
            hasher,
            token_ttl,
            decoy_digest,
        })
    }

    /// Register a new user and return their id.
    ///
    /// The plaintext password exists only long enough to digest it.
    pub async fn register(&self, login: &str, password: &str) -> Result<Uuid, AuthError> {
        info!(login = %login, "registering user");

        let hasher = self.hasher.clone();
        let password = password.to_string();
        let digest = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|_| AuthError::Hash)?
            .map_err(|_| AuthError::Hash)?;

        match self.users.create(login, &digest).await {
            Ok(id) => {
                info!(login = %login, user = %id, "user registered");
                Ok(id)
            }
            Err(StorageError::Conflict(_)) => {
                info!(login = %login, "login already taken");
                Err(AuthError::LoginTaken)
            }
            Err(e) => {
                warn!(login = %login, error = %e, "failed to save user");
                Err(e.into())
            }
        }
    }

    /// Authenticate a login for the given application and return a signed
    /// session token.
    pub async fn login(
        &self,
        login: &str,
        password: &str,
        app_id: i64,
    ) -> Result<String, AuthError> {
        info!(login = %login, app = app_id, "attempting to login user");

        let user = match self.users.find(login).await {
            Ok(user) => Some(user),
            Err(StorageError::NotFound(_)) => None,
            Err(e) => {
                warn!(login = %login, error = %e, "failed to get user");
                return Err(e.into());
            }
        };

        if !self.check_password(&user, password).await? {
            info!(login = %login, "invalid credentials");
            return Err(AuthError::InvalidCredentials);
        }
        // check_password is false for an absent user.
        let user = match user {
            Some(user) => user,
            None => return Err(AuthError::InvalidCredentials),
        };

        // A missing application is an infrastructure problem, not a
        // credentials problem; it must not map to InvalidCredentials.
        let app = self.apps.app(app_id).await.map_err(|e| {
            warn!(app = app_id, error = %e, "failed to resolve application");
            AuthError::Store(e)
        })?;

        let token = self.codec.issue(&user, &app, self.token_ttl);
        info!(login = %login, app = app_id, "user logged in successfully");
        Ok(token)
    }

    /// One digest verification regardless of whether the login exists.
    async fn check_password(
        &self,
        user: &Option<User>,
        password: &str,
    ) -> Result<bool, AuthError> {
        let known = user.is_some();
        let digest = match user {
            Some(user) => user.pass_hash.clone(),
            None => self.decoy_digest.clone(),
        };

        let hasher = self.hasher.clone();
        let candidate = password.to_string();
        let matched = tokio::task::spawn_blocking(move || hasher.verify(&digest, &candidate))
            .await
            .map_err(|_| AuthError::Hash)?;

        Ok(known && matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::domain::App;

    fn cheap_hasher() -> Hasher {
        Hasher::with_params(
            argon2::Params::MIN_M_COST,
            argon2::Params::MIN_T_COST,
            argon2::Params::MIN_P_COST,
        )
        .unwrap()
    }

    async fn service(store: Arc<MemoryStore>) -> AuthService {
        let codec = Arc::new(TokenCodec::new(store.clone()));
        AuthService::new(
            store.clone(),
            store,
            codec,
            cheap_hasher(),
            Duration::from_secs(3600),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let store = Arc::new(MemoryStore::new());
        store
            .put_app(App {
                id: 1,
                name: "web".to_string(),
                secret: "s3cret".to_string(),
            })
            .await
            .unwrap();
        let auth = service(store.clone()).await;

        let user_id = auth.register("alice", "pw123").await.unwrap();
        let token = auth.login("alice", "pw123", 1).await.unwrap();

        let codec = TokenCodec::new(store);
        let claims = codec.verify(&token).await.unwrap();
        assert_eq!(claims.uid, user_id);
        assert_eq!(claims.login, "alice");
        assert_eq!(claims.app_id, 1);
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let auth = service(Arc::new(MemoryStore::new())).await;

        auth.register("alice", "pw123").await.unwrap();
        let err = auth.register("alice", "other").await.unwrap_err();
        assert!(matches!(err, AuthError::LoginTaken));
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_login_collapse() {
        let auth = service(Arc::new(MemoryStore::new())).await;
        auth.register("alice", "pw123").await.unwrap();

        let wrong = auth.login("alice", "wrongpw", 1).await.unwrap_err();
        let unknown = auth.login("nobody", "pw123", 1).await.unwrap_err();

        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn test_unprovisioned_app_is_not_a_credentials_error() {
        let auth = service(Arc::new(MemoryStore::new())).await;
        auth.register("alice", "pw123").await.unwrap();

        let err = auth.login("alice", "pw123", 999).await.unwrap_err();
        assert!(matches!(err, AuthError::Store(StorageError::NotFound(_))));
    }
}
