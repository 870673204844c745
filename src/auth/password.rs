//! Password digests.
//!
//! Passwords are stored only as salted argon2id PHC strings and compared
//! through the adaptive verifier, never with plain equality.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("failed to hash password: {0}")]
    Hash(String),

    #[error("invalid hash parameters: {0}")]
    Params(String),
}

/// Salted argon2id hashing with tunable cost.
#[derive(Debug, Clone)]
pub struct Hasher {
    params: Params,
}

impl Hasher {
    /// Default cost, suitable for production logins.
    pub fn new() -> Self {
        Self {
            params: Params::default(),
        }
    }

    /// Explicit cost parameters. Tests use cheap ones.
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, HashError> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| HashError::Params(e.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Digest a password with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        let digest = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| HashError::Hash(e.to_string()))?;
        Ok(digest.to_string())
    }

    /// Verify a password against a stored digest.
    ///
    /// Malformed digests verify as false rather than erroring out; the
    /// caller cannot tell a bad digest from a wrong password.
    pub fn verify(&self, digest: &str, password: &str) -> bool {
        match PasswordHash::new(digest) {
            Ok(parsed) => self
                .argon2()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}
