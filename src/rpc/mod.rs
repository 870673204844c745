//! Per-call authorization gate, method dispatch, and the HTTP surface.
//!
//! Chain order per call: recovery, audit logging, selective token
//! verification, then the typed handler.

pub mod context;
pub mod gate;
pub mod handlers;
pub mod http;

pub use context::{CallContext, CallMeta, RequestIdentity};
pub use gate::{AuthGate, Dispatch, FaultObserver, TracingFaultObserver, PROTECTED_METHODS};
pub use handlers::ApiRouter;
pub use http::{ApiServer, ApiServerConfig};
