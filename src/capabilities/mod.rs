//! Compiled capability model and registry.
//!
//! The compiler produces `Capability` values and stores them in a
//! `CapabilityRegistry`; the service layer reads both. Nothing in this
//! module performs I/O.

pub mod capability;
pub mod registry;

// Re-export main types.
pub use capability::{build_input_schema, Capability, CapabilityDraft, CapabilitySummary};
pub use registry::CapabilityRegistry;
