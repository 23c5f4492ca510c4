//! Normalized route descriptors.
//!
//! A `RouteDescriptor` is the immutable record of one API operation:
//! method, path template, parameter specs, tags, and documentation.
//! Descriptors are built once from the source document, validated, wrapped
//! in `Arc`, and never mutated by any downstream stage.

use std::collections::BTreeSet;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::SpecError;
use crate::openapi::schema::SchemaObject;

/// Matches `{name}` placeholders in a path template.
static PLACEHOLDER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_\-]*)\}").unwrap());

// ---------------------------------------------------------------------------
// HttpMethod
// ---------------------------------------------------------------------------

/// HTTP verbs a route descriptor can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Trace,
}

impl HttpMethod {
    /// Uppercase wire form of the verb.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
        }
    }

    /// Parse a verb from a string, case-insensitive.
    ///
    /// Returns `None` for anything that is not a recognized HTTP method.
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "PATCH" => Some(HttpMethod::Patch),
            "DELETE" => Some(HttpMethod::Delete),
            "HEAD" => Some(HttpMethod::Head),
            "OPTIONS" => Some(HttpMethod::Options),
            "TRACE" => Some(HttpMethod::Trace),
            _ => None,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ParameterLocation
// ---------------------------------------------------------------------------

/// Where a parameter is carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterLocation::Path => write!(f, "path"),
            ParameterLocation::Query => write!(f, "query"),
            ParameterLocation::Header => write!(f, "header"),
        }
    }
}

// ---------------------------------------------------------------------------
// ParameterSpec
// ---------------------------------------------------------------------------

/// One declared parameter of a route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Parameter name as it appears on the wire.
    pub name: String,
    /// Wire location: path, query, or header.
    pub location: ParameterLocation,
    /// Whether a value must be supplied at call time.
    #[serde(default)]
    pub required: bool,
    /// Declared value schema.
    #[serde(default)]
    pub schema: SchemaObject,
    /// Array serialization style for query parameters: `true` emits one
    /// entry per element, `false` one comma-joined entry.
    #[serde(default = "default_true")]
    pub explode: bool,
    /// Human-readable description from the source document.
    #[serde(default)]
    pub description: Option<String>,
}

fn default_true() -> bool {
    true
}

impl ParameterSpec {
    /// Create a path parameter. Path parameters are always required.
    pub fn path(name: impl Into<String>, schema: SchemaObject) -> Self {
        Self {
            name: name.into(),
            location: ParameterLocation::Path,
            required: true,
            schema,
            explode: true,
            description: None,
        }
    }

    /// Create an optional query parameter.
    pub fn query(name: impl Into<String>, schema: SchemaObject) -> Self {
        Self {
            name: name.into(),
            location: ParameterLocation::Query,
            required: false,
            schema,
            explode: true,
            description: None,
        }
    }

    /// Create an optional header parameter.
    pub fn header(name: impl Into<String>, schema: SchemaObject) -> Self {
        Self {
            name: name.into(),
            location: ParameterLocation::Header,
            required: false,
            schema,
            explode: true,
            description: None,
        }
    }

    /// Builder: mark the parameter required.
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Builder: set the explode style for query arrays.
    pub fn with_explode(mut self, explode: bool) -> Self {
        self.explode = explode;
        self
    }

    /// Builder: attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

// ---------------------------------------------------------------------------
// RequestBodySpec
// ---------------------------------------------------------------------------

/// Declared request body of a route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestBodySpec {
    /// Payload schema.
    #[serde(default)]
    pub schema: SchemaObject,
    /// Whether the body must be supplied at call time.
    #[serde(default)]
    pub required: bool,
    /// Declared media type of the payload.
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

fn default_content_type() -> String {
    "application/json".to_string()
}

impl RequestBodySpec {
    /// Create a JSON request body spec.
    pub fn json(schema: SchemaObject) -> Self {
        Self {
            schema,
            required: false,
            content_type: default_content_type(),
        }
    }

    /// Builder: mark the body required.
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

// ---------------------------------------------------------------------------
// RouteDescriptor
// ---------------------------------------------------------------------------

/// Immutable record of one API operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteDescriptor {
    /// HTTP verb.
    pub method: HttpMethod,
    /// Path template with `{name}` placeholders.
    pub path_template: String,
    /// Source-provided operation id, if any.
    #[serde(default)]
    pub operation_id: Option<String>,
    /// Short human summary from the source document.
    #[serde(default)]
    pub summary: Option<String>,
    /// Longer description from the source document.
    #[serde(default)]
    pub description: Option<String>,
    /// Source-document tags.
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Declared parameters, in document order.
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
    /// Declared request body, if any.
    #[serde(default)]
    pub request_body: Option<RequestBodySpec>,
}

impl RouteDescriptor {
    /// Create a descriptor for a method and path template.
    pub fn new(method: HttpMethod, path_template: impl Into<String>) -> Self {
        Self {
            method,
            path_template: path_template.into(),
            operation_id: None,
            summary: None,
            description: None,
            tags: BTreeSet::new(),
            parameters: Vec::new(),
            request_body: None,
        }
    }

    /// Builder: set the operation id.
    pub fn with_operation_id(mut self, operation_id: impl Into<String>) -> Self {
        self.operation_id = Some(operation_id.into());
        self
    }

    /// Builder: set the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Builder: set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder: add a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Builder: add a parameter spec.
    pub fn with_parameter(mut self, parameter: ParameterSpec) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Builder: set the request body spec.
    pub fn with_request_body(mut self, body: RequestBodySpec) -> Self {
        self.request_body = Some(body);
        self
    }

    /// Placeholder names in the path template, in order of appearance.
    pub fn path_placeholders(&self) -> Vec<String> {
        PLACEHOLDER_PATTERN
            .captures_iter(&self.path_template)
            .map(|cap| cap[1].to_string())
            .collect()
    }

    /// Parameters at the given location, in declaration order.
    pub fn parameters_at(
        &self,
        location: ParameterLocation,
    ) -> impl Iterator<Item = &ParameterSpec> {
        self.parameters
            .iter()
            .filter(move |p| p.location == location)
    }

    /// Fallback naming source for routes without an operation id.
    pub fn fallback_name(&self) -> String {
        format!("{}_{}", self.method, self.path_template)
    }

    /// Check the structural invariants that make a descriptor bindable.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant: unbound placeholder, path
    /// parameter missing from the template, optional path parameter, or a
    /// duplicate `(location, name)` pair.
    pub fn validate(&self) -> Result<(), SpecError> {
        let placeholders = self.path_placeholders();

        for name in &placeholders {
            if !self
                .parameters_at(ParameterLocation::Path)
                .any(|p| &p.name == name)
            {
                return Err(SpecError::UnboundPlaceholder {
                    path: self.path_template.clone(),
                    name: name.clone(),
                });
            }
        }

        for parameter in self.parameters_at(ParameterLocation::Path) {
            if !placeholders.contains(&parameter.name) {
                return Err(SpecError::MissingPlaceholder {
                    path: self.path_template.clone(),
                    name: parameter.name.clone(),
                });
            }
            if !parameter.required {
                return Err(SpecError::OptionalPathParameter {
                    path: self.path_template.clone(),
                    name: parameter.name.clone(),
                });
            }
        }

        let mut seen = BTreeSet::new();
        for parameter in &self.parameters {
            if !seen.insert((parameter.location, parameter.name.clone())) {
                return Err(SpecError::DuplicateParameter {
                    path: self.path_template.clone(),
                    location: parameter.location,
                    name: parameter.name.clone(),
                });
            }
        }

        Ok(())
    }
}
