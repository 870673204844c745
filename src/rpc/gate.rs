//! The per-call authorization gate.
//!
//! An ordered interceptor chain applied to every inbound call, outermost
//! first:
//!
//! 1. Recovery: a panic anywhere below becomes an opaque internal error;
//!    the process never dies from one call's fault.
//! 2. Audit logging: method name and payload shape, for allowed and
//!    rejected calls alike.
//! 3. Selective authentication: calls to protected routes must carry a
//!    token that verifies; the verified subject is injected into the call
//!    context. Everything else passes through unauthenticated.

use crate::auth::token::TokenCodec;
use crate::error::ApiError;
use crate::rpc::context::{CallContext, CallMeta};
use async_trait::async_trait;
use futures::FutureExt;
use serde_json::Value;
use std::backtrace::Backtrace;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Routes that require a verified session token, by exact full-method
/// name. Any route not listed here is public.
pub const PROTECTED_METHODS: [&str; 7] = [
    "CreateLoginItem",
    "GetItem",
    "GetItems",
    "GetLoginItem",
    "GetLoginItems",
    "GetItemsByFolder",
    "DeleteLoginItem",
];

/// Terminal stage of the chain: typed method dispatch.
#[async_trait]
pub trait Dispatch: Send + Sync {
    async fn dispatch(
        &self,
        ctx: CallContext,
        method: &str,
        payload: Value,
    ) -> Result<Value, ApiError>;
}

/// Receives diagnostics for faults contained by the recovery stage.
pub trait FaultObserver: Send + Sync {
    fn call_panicked(&self, method: &str, message: &str, backtrace: &Backtrace);
}

/// Default observer: structured log via tracing.
pub struct TracingFaultObserver;

impl FaultObserver for TracingFaultObserver {
    fn call_panicked(&self, method: &str, message: &str, backtrace: &Backtrace) {
        error!(
            method = %method,
            panic = %message,
            backtrace = %backtrace,
            "recovered from panic"
        );
    }
}

/// The gate in front of every call.
pub struct AuthGate {
    codec: Arc<TokenCodec>,
    dispatcher: Arc<dyn Dispatch>,
    protected: HashSet<&'static str>,
    observer: Arc<dyn FaultObserver>,
}

impl AuthGate {
    pub fn new(codec: Arc<TokenCodec>, dispatcher: Arc<dyn Dispatch>) -> Self {
        Self {
            codec,
            dispatcher,
            protected: PROTECTED_METHODS.into_iter().collect(),
            observer: Arc::new(TracingFaultObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn FaultObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Run one call through the chain.
    pub async fn call(&self, meta: CallMeta, payload: Value) -> Result<Value, ApiError> {
        let method = meta.method.clone();
        let fut = self.logged(meta, payload);

        match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                self.observer.call_panicked(
                    &method,
                    panic_message(panic.as_ref()),
                    &Backtrace::force_capture(),
                );
                Err(ApiError::Internal)
            }
        }
    }

    async fn logged(&self, meta: CallMeta, payload: Value) -> Result<Value, ApiError> {
        // Audited before authorization: rejected calls are observed too.
        info!(
            method = %meta.method,
            shape = %payload_shape(&payload),
            "call received"
        );
        self.authorized(meta, payload).await
    }

    async fn authorized(&self, meta: CallMeta, payload: Value) -> Result<Value, ApiError> {
        if !self.protected.contains(meta.method.as_str()) {
            return self
                .dispatcher
                .dispatch(CallContext::unauthenticated(), &meta.method, payload)
                .await;
        }

        let token = match meta.bearer.as_deref() {
            Some(token) if !token.is_empty() => token,
            _ => {
                warn!(method = %meta.method, "missing bearer token");
                return Err(ApiError::TokenInvalid);
            }
        };

        let claims = self.codec.verify(token).await.map_err(|e| {
            warn!(method = %meta.method, error = %e, "token verification failed");
            ApiError::from(e)
        })?;

        // The injected subject comes from the signature-verified pass; the
        // handler is never invoked on a failed verification.
        self.dispatcher
            .dispatch(CallContext::authenticated(claims.uid), &meta.method, payload)
            .await
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic payload"
    }
}

/// Shape of a payload for audit logs: object keys or a coarse kind marker.
/// Values never appear here; neither do tokens or passwords.
fn payload_shape(payload: &Value) -> String {
    match payload {
        Value::Object(map) => {
            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
            format!("{{{}}}", keys.join(","))
        }
        Value::Array(items) => format!("[{}]", items.len()),
        Value::Null => "null".to_string(),
        _ => "scalar".to_string(),
    }
}
