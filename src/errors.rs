//! Error types for capability compilation and invocation.
//!
//! Compilation-time errors (`SpecError`) abort the whole run; no partial
//! registry is ever observable. Invocation-time errors (`InvokeError` and
//! its sources) are per-call and leave the registry and other in-flight
//! invocations untouched. Nothing here is logged or masked; callers layer
//! their own reporting on top.

use thiserror::Error;

use crate::openapi::route::ParameterLocation;

/// Structural errors in the source API description.
///
/// Fatal to compilation: the first violation aborts the run and no
/// registry is produced.
#[derive(Debug, Error)]
pub enum SpecError {
    /// A `{name}` placeholder in a path template has no matching
    /// path-located parameter spec.
    #[error("path template '{path}' has placeholder '{{{name}}}' with no matching path parameter")]
    UnboundPlaceholder { path: String, name: String },

    /// A path-located parameter spec does not appear in the template.
    #[error("path parameter '{name}' does not appear in template '{path}'")]
    MissingPlaceholder { path: String, name: String },

    /// A path-located parameter spec is marked optional.
    #[error("path parameter '{name}' on '{path}' must be required")]
    OptionalPathParameter { path: String, name: String },

    /// Two parameter specs share the same location and name.
    #[error("duplicate {location} parameter '{name}' on '{path}'")]
    DuplicateParameter {
        path: String,
        location: ParameterLocation,
        name: String,
    },

    /// Two operations in the source document carry the same operation id.
    #[error("duplicate operation id '{operation_id}' in source document")]
    DuplicateOperationId { operation_id: String },

    /// The source document itself is malformed.
    #[error("malformed API document: {message}")]
    Document { message: String },
}

/// Errors raised while binding call-time arguments to a route.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindError {
    /// A required path or header parameter has no usable value.
    #[error("missing required {location} parameter '{name}'")]
    MissingRequiredParameter {
        name: String,
        location: ParameterLocation,
    },
}

/// Argument validation failure, surfaced verbatim from the schema
/// validator with no added interpretation.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid arguments: {message}")]
pub struct ValidationError {
    /// The validator's own description of every violation.
    pub message: String,
}

/// Transport-level failure, surfaced verbatim and never retried here.
/// Retry policy, if any, belongs to the transport collaborator.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP client failure (connect, timeout, status, decode).
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Any other transport failure, carried as-is.
    #[error("transport failure: {0}")]
    Other(String),
}

/// Per-call invocation errors.
///
/// `NotFound` has the same shape whether the identifier never existed or
/// was excluded during compilation, so exclusion is indistinguishable
/// from non-existence to callers.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// Identifier absent from the registry.
    #[error("no capability named '{identifier}'")]
    NotFound { identifier: String },

    #[error(transparent)]
    Bind(#[from] BindError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_shape_is_identifier_only() {
        let unknown = InvokeError::NotFound {
            identifier: "missing".into(),
        };
        let excluded = InvokeError::NotFound {
            identifier: "missing".into(),
        };
        assert_eq!(unknown.to_string(), excluded.to_string());
        assert_eq!(unknown.to_string(), "no capability named 'missing'");
    }

    #[test]
    fn test_bind_error_display() {
        let err = BindError::MissingRequiredParameter {
            name: "id".into(),
            location: ParameterLocation::Path,
        };
        assert_eq!(err.to_string(), "missing required path parameter 'id'");
    }

    #[test]
    fn test_spec_error_display_includes_placeholder() {
        let err = SpecError::UnboundPlaceholder {
            path: "/users/{id}".into(),
            name: "id".into(),
        };
        assert!(err.to_string().contains("{id}"));
    }
}
