//! Pure binding of call-time arguments to concrete request parts.

pub mod binder;

// Re-export main types.
pub use binder::{bind, ResolvedRequest};
