//! Passkeeper - password manager backend
//!
//! Stores credential records for authenticated users. Each API consumer
//! (application) holds its own signing secret; session tokens are scoped to
//! one application and every protected call is checked by a selective
//! two-stage verification gate before it reaches a handler.

pub mod auth;
pub mod domain;
pub mod error;
pub mod items;
pub mod rpc;
pub mod store;

pub use auth::{AuthService, Claims, Hasher, TokenCodec};
pub use error::ApiError;
pub use rpc::{ApiServer, ApiServerConfig, AuthGate, CallContext, CallMeta};
