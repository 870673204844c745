//! Core data model shared by services, stores, and the wire layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A registered user.
///
/// `pass_hash` is an argon2 PHC string; it is compared only through the
/// adaptive verifier, never with string equality.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub login: String,
    pub pass_hash: String,
}

/// An API consumer ("application") with its own token-signing secret.
///
/// Apps are read-only configuration data; the secret is provisioned
/// out-of-band and never leaves the server.
#[derive(Clone)]
pub struct App {
    pub id: i64,
    pub name: String,
    pub secret: String,
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Kind of stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Login,
    Note,
}

impl ItemKind {
    /// Storage column encoding.
    pub fn code(self) -> i16 {
        match self {
            ItemKind::Login => 0,
            ItemKind::Note => 1,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(ItemKind::Login),
            1 => Some(ItemKind::Note),
            _ => None,
        }
    }
}

/// A stored record's common envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub kind: ItemKind,
    pub name: String,
    pub folder_id: Uuid,
    pub user_id: Uuid,
    pub is_favorite: bool,
}

/// A login-type record: an [`Item`] plus the credential payload.
///
/// `encrypted_password` is opaque to the server; clients encrypt before
/// sending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginItem {
    #[serde(flatten)]
    pub item: Item,
    pub login: String,
    pub encrypted_password: String,
}
