//! Per-call metadata and the typed identity context.

use uuid::Uuid;

/// Transport-independent metadata for one inbound call.
#[derive(Debug, Clone)]
pub struct CallMeta {
    /// Full method name, matched exactly against the protected set.
    pub method: String,
    /// Bearer token, if the transport carried one.
    pub bearer: Option<String>,
}

/// The authenticated subject for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestIdentity {
    pub user_id: Uuid,
}

/// Execution-scoped context handed to every handler.
///
/// `identity` is set by the authorization gate from signature-verified
/// claims and nowhere else. It lives for exactly one call; handlers read
/// it, they never write it.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    pub identity: Option<RequestIdentity>,
}

impl CallContext {
    pub fn unauthenticated() -> Self {
        Self { identity: None }
    }

    pub fn authenticated(user_id: Uuid) -> Self {
        Self {
            identity: Some(RequestIdentity { user_id }),
        }
    }
}
