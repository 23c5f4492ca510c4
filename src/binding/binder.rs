//! Parameter binding — argument mapping to concrete request parts.
//!
//! `bind` computes the resolved path, query pairs, and headers for one
//! invocation of a route. It is pure: no I/O, no shared state, safe to
//! run concurrently for any number of invocations. Values are assumed
//! already validated and coerced by the schema validator; the binder only
//! serializes them.
//!
//! Serialization follows the source conventions: path arrays comma-join
//! ("simple" style), query arrays either repeat the key (`explode = true`,
//! the default) or comma-join into one entry (`explode = false`). Query
//! pairs are emitted unencoded; percent-encoding is the transport's job.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::capabilities::capability::BODY_ARGUMENT;
use crate::errors::BindError;
use crate::openapi::route::{HttpMethod, ParameterLocation, RouteDescriptor};

// ---------------------------------------------------------------------------
// ResolvedRequest
// ---------------------------------------------------------------------------

/// Concrete request parts for one invocation, ready for a transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRequest {
    /// HTTP verb of the originating route.
    pub method: HttpMethod,
    /// Path with every placeholder substituted.
    pub path: String,
    /// Query pairs in declaration order, unencoded.
    pub query: Vec<(String, String)>,
    /// Header pairs in declaration order.
    pub headers: Vec<(String, String)>,
    /// Request payload, passed through verbatim.
    pub body: Option<Value>,
}

// ---------------------------------------------------------------------------
// bind
// ---------------------------------------------------------------------------

/// Bind call-time arguments to a route.
///
/// # Errors
///
/// `BindError::MissingRequiredParameter` when a path parameter has no
/// usable value (absent, null, or serializing to an empty segment) or a
/// required header is absent.
pub fn bind(
    route: &RouteDescriptor,
    arguments: &HashMap<String, Value>,
) -> Result<ResolvedRequest, BindError> {
    let mut path = route.path_template.clone();
    for parameter in route.parameters_at(ParameterLocation::Path) {
        let value = arguments
            .get(&parameter.name)
            .filter(|v| !v.is_null())
            .ok_or_else(|| BindError::MissingRequiredParameter {
                name: parameter.name.clone(),
                location: ParameterLocation::Path,
            })?;
        let segment = format_path_value(value);
        // An empty segment would silently change the path shape.
        if segment.is_empty() {
            return Err(BindError::MissingRequiredParameter {
                name: parameter.name.clone(),
                location: ParameterLocation::Path,
            });
        }
        path = path.replace(&format!("{{{}}}", parameter.name), &segment);
    }

    let mut query = Vec::new();
    for parameter in route.parameters_at(ParameterLocation::Query) {
        let Some(value) = arguments.get(&parameter.name).filter(|v| !v.is_null()) else {
            continue;
        };
        match value {
            // Empty strings are omitted, not errors; "0" and 0 are kept.
            Value::String(s) if s.is_empty() => continue,
            Value::Array(elements) => {
                if parameter.explode {
                    for element in elements {
                        query.push((parameter.name.clone(), format_scalar(element)));
                    }
                } else {
                    let joined = elements
                        .iter()
                        .map(format_scalar)
                        .collect::<Vec<_>>()
                        .join(",");
                    query.push((parameter.name.clone(), joined));
                }
            }
            other => query.push((parameter.name.clone(), format_scalar(other))),
        }
    }

    let mut headers = Vec::new();
    for parameter in route.parameters_at(ParameterLocation::Header) {
        match arguments.get(&parameter.name).filter(|v| !v.is_null()) {
            Some(value) => headers.push((parameter.name.clone(), format_scalar(value))),
            None if parameter.required => {
                return Err(BindError::MissingRequiredParameter {
                    name: parameter.name.clone(),
                    location: ParameterLocation::Header,
                });
            }
            None => {}
        }
    }

    // The body argument only exists when the route declares a body and no
    // parameter claims the `body` key for itself.
    let body_key_taken = route.parameters.iter().any(|p| p.name == BODY_ARGUMENT);
    let body = if route.request_body.is_some() && !body_key_taken {
        arguments
            .get(BODY_ARGUMENT)
            .filter(|v| !v.is_null())
            .cloned()
    } else {
        None
    };

    Ok(ResolvedRequest {
        method: route.method,
        path,
        query,
        headers,
        body,
    })
}

/// Stringify a scalar value for a path segment, query entry, or header.
fn format_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        // Structured values in scalar positions carry compact JSON.
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

/// Serialize a path value: arrays comma-join, everything else stringifies.
fn format_path_value(value: &Value) -> String {
    match value {
        Value::Array(elements) => elements
            .iter()
            .map(format_scalar)
            .collect::<Vec<_>>()
            .join(","),
        other => format_scalar(other),
    }
}
