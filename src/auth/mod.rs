//! Authentication: password digests, the auth service, and session tokens.
//!
//! Session tokens are stateless bearer credentials scoped to exactly one
//! application (tenant) and signed with that application's secret.

pub mod password;
pub mod service;
pub mod token;

pub use password::Hasher;
pub use service::{AuthError, AuthService};
pub use token::{Claims, TokenCodec, TokenError};
