//! OpenAPI-facing model: route descriptors, schema descriptions, and the
//! document loader.
//!
//! Everything downstream of this module works on `RouteDescriptor` values;
//! nothing else ever touches the source document.

pub mod document;
pub mod route;
pub mod schema;

// Re-export main types.
pub use document::{load_routes, load_routes_from_str};
pub use route::{
    HttpMethod, ParameterLocation, ParameterSpec, RequestBodySpec, RouteDescriptor,
};
pub use schema::SchemaObject;
