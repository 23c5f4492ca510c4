//! Transport collaborators — where invocation I/O actually happens.
//!
//! Everything upstream of this module is pure; a `Transport` takes a
//! `ResolvedRequest` and performs the network call. Authentication is
//! whatever the underlying client was configured with, passed through
//! unmodified. Cancellation, timeouts, and retry policy all live here or
//! below, never in the binder or registry.

pub mod http;

use async_trait::async_trait;
use serde_json::Value;

use crate::binding::binder::ResolvedRequest;
use crate::errors::TransportError;

pub use http::HttpTransport;

/// A collaborator that executes resolved requests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform the network call for one resolved request.
    ///
    /// Each call is independent; implementations must be safe to invoke
    /// concurrently.
    ///
    /// # Errors
    ///
    /// `TransportError`, surfaced verbatim to the invocation caller.
    async fn execute(&self, request: &ResolvedRequest) -> Result<Value, TransportError>;
}
