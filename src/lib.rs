//! # capforge
//!
//! Compiles an OpenAPI route description into a set of runtime-invocable
//! capabilities — callable actions, readable resources, and parameterized
//! resource templates — exposed through a uniform list/invoke surface.
//!
//! The pipeline is one-way: route descriptors are classified under an
//! ordered rule chain (user rules, then built-in defaults, then an
//! optional override hook), named by a collision-free synthesizer,
//! instantiated, customized in place exactly once, and stored in an
//! immutable registry. Invocation validates arguments, binds them to a
//! concrete request, and delegates the network call to a transport
//! collaborator.
//!
//! ```rust
//! use capforge::{compile, CompileOptions, HttpMethod, MappingRule, CapabilityKind};
//! use capforge::{ParameterSpec, RouteDescriptor, SchemaObject};
//!
//! let routes = vec![
//!     RouteDescriptor::new(HttpMethod::Get, "/users/{id}")
//!         .with_operation_id("get_user")
//!         .with_parameter(ParameterSpec::path("id", SchemaObject::integer())),
//!     RouteDescriptor::new(HttpMethod::Get, "/users").with_operation_id("list_users"),
//! ];
//!
//! let options = CompileOptions::new().with_rule(
//!     MappingRule::new(CapabilityKind::ReadableTemplate)
//!         .with_methods([HttpMethod::Get])
//!         .with_path_pattern(r"\{")
//!         .unwrap(),
//! );
//!
//! let registry = compile(routes, &options).unwrap();
//! assert_eq!(registry.get("get_user").unwrap().kind, CapabilityKind::ReadableTemplate);
//! assert_eq!(registry.get("list_users").unwrap().kind, CapabilityKind::Action);
//! ```

pub mod binding;
pub mod capabilities;
pub mod compiler;
pub mod errors;
pub mod openapi;
pub mod service;
pub mod transport;

// Re-exports for the common surface.
pub use binding::binder::{bind, ResolvedRequest};
pub use capabilities::capability::{Capability, CapabilityDraft, CapabilitySummary};
pub use capabilities::registry::CapabilityRegistry;
pub use compiler::pipeline::{compile, compile_document, CompileOptions, CustomizeFn};
pub use compiler::rules::{
    CapabilityKind, MappingRule, MethodSelector, PathPattern, RouteOverrideFn,
};
pub use errors::{BindError, InvokeError, SpecError, TransportError, ValidationError};
pub use openapi::document::{load_routes, load_routes_from_str};
pub use openapi::route::{
    HttpMethod, ParameterLocation, ParameterSpec, RequestBodySpec, RouteDescriptor,
};
pub use openapi::schema::SchemaObject;
pub use service::CapabilityService;
pub use transport::{HttpTransport, Transport};

/// Crate version.
pub const VERSION: &str = "0.3.0";
