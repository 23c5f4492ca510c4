//! Compiled capabilities — the invocable units a registry exposes.
//!
//! A capability is created once per matched, non-excluded route during
//! compilation, mutated in place exactly once through `CapabilityDraft`
//! by the customization hook, and immutable afterwards for the lifetime
//! of the registry.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::compiler::rules::CapabilityKind;
use crate::openapi::route::RouteDescriptor;

// ---------------------------------------------------------------------------
// Capability
// ---------------------------------------------------------------------------

/// One compiled, invocable unit.
///
/// Not serializable as a whole: the descriptor back-reference is a
/// runtime artifact. `CapabilitySummary` is the wire-facing view.
#[derive(Debug, Clone)]
pub struct Capability {
    /// Identifier, unique within one registry.
    pub identifier: String,
    /// Kind assigned by classification. Never `Excluded` here; excluded
    /// routes are dropped before instantiation.
    pub kind: CapabilityKind,
    /// Human-facing title.
    pub title: String,
    /// Human-facing description.
    pub description: String,
    /// Rule-assigned extra tags, global tags, and hook-added tags.
    pub tags: BTreeSet<String>,
    /// Originating route. Shared ownership keeps in-flight invocations
    /// valid even if the capability is removed from a live registry.
    pub descriptor: Arc<RouteDescriptor>,
    /// Combined JSON Schema over the route's parameters and request body;
    /// what the argument validator is compiled from.
    pub input_schema: Value,
}

impl Capability {
    /// Summary view for listing.
    pub fn summary(&self) -> CapabilitySummary {
        CapabilitySummary {
            identifier: self.identifier.clone(),
            kind: self.kind,
            title: self.title.clone(),
            description: self.description.clone(),
            tags: self.tags.clone(),
        }
    }
}

/// Listing entry exposed to the surrounding protocol layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilitySummary {
    pub identifier: String,
    pub kind: CapabilityKind,
    pub title: String,
    pub description: String,
    pub tags: BTreeSet<String>,
}

// ---------------------------------------------------------------------------
// CapabilityDraft
// ---------------------------------------------------------------------------

/// Mutable view handed to the customization hook.
///
/// Restricted to the fields a hook may change; everything else about the
/// capability is fixed by classification and naming before the hook runs,
/// and the frozen `Capability` is immutable afterwards.
#[derive(Debug, Clone)]
pub struct CapabilityDraft {
    pub title: String,
    pub description: String,
    pub tags: BTreeSet<String>,
}

impl CapabilityDraft {
    /// Default title and description for a route.
    ///
    /// Title falls back from the summary to the identifier; description
    /// from the description to the summary to a method+path line.
    pub fn for_route(
        route: &RouteDescriptor,
        identifier: &str,
        tags: BTreeSet<String>,
    ) -> Self {
        let title = route
            .summary
            .clone()
            .unwrap_or_else(|| identifier.to_string());
        let description = route
            .description
            .clone()
            .or_else(|| route.summary.clone())
            .unwrap_or_else(|| format!("{} {}", route.method, route.path_template));
        Self {
            title,
            description,
            tags,
        }
    }

    /// Freeze the draft into an immutable capability.
    pub fn freeze(
        self,
        identifier: String,
        kind: CapabilityKind,
        descriptor: Arc<RouteDescriptor>,
    ) -> Capability {
        let input_schema = build_input_schema(&descriptor);
        Capability {
            identifier,
            kind,
            title: self.title,
            description: self.description,
            tags: self.tags,
            descriptor,
            input_schema,
        }
    }
}

// ---------------------------------------------------------------------------
// Input schema
// ---------------------------------------------------------------------------

/// Key under which a request body argument is supplied.
pub const BODY_ARGUMENT: &str = "body";

/// Build the combined argument schema for a route.
///
/// One object schema: a property per declared parameter plus a `body`
/// property when the route declares a request body. A parameter that is
/// itself named `body` keeps its key; the body property is not emitted in
/// that case so the mapping stays unambiguous.
pub fn build_input_schema(route: &RouteDescriptor) -> Value {
    let mut properties = Map::new();
    let mut required: Vec<Value> = Vec::new();

    for parameter in &route.parameters {
        let mut schema = parameter.schema.to_json_schema();
        if let (Some(obj), Some(text)) = (schema.as_object_mut(), &parameter.description) {
            obj.insert("description".into(), json!(text));
        }
        properties.insert(parameter.name.clone(), schema);
        if parameter.required {
            required.push(json!(parameter.name));
        }
    }

    if let Some(body) = &route.request_body {
        if !properties.contains_key(BODY_ARGUMENT) {
            properties.insert(BODY_ARGUMENT.into(), body.schema.to_json_schema());
            if body.required {
                required.push(json!(BODY_ARGUMENT));
            }
        }
    }

    let mut out = Map::new();
    out.insert("type".into(), json!("object"));
    out.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        out.insert("required".into(), Value::Array(required));
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi::route::{HttpMethod, ParameterSpec, RequestBodySpec};
    use crate::openapi::schema::SchemaObject;

    fn route() -> RouteDescriptor {
        RouteDescriptor::new(HttpMethod::Post, "/users/{id}")
            .with_operation_id("update_user")
            .with_summary("Update a user")
            .with_parameter(ParameterSpec::path("id", SchemaObject::integer()))
            .with_parameter(
                ParameterSpec::query("notify", SchemaObject::Boolean)
                    .with_description("Send a notification email"),
            )
            .with_request_body(RequestBodySpec::json(SchemaObject::string()).with_required(true))
    }

    #[test]
    fn test_draft_defaults_title_from_summary() {
        let draft = CapabilityDraft::for_route(&route(), "update_user", BTreeSet::new());
        assert_eq!(draft.title, "Update a user");
        // No description on the route: falls back to the summary.
        assert_eq!(draft.description, "Update a user");
    }

    #[test]
    fn test_draft_falls_back_to_identifier_and_method_path() {
        let bare = RouteDescriptor::new(HttpMethod::Get, "/ping");
        let draft = CapabilityDraft::for_route(&bare, "ping", BTreeSet::new());
        assert_eq!(draft.title, "ping");
        assert_eq!(draft.description, "GET /ping");
    }

    #[test]
    fn test_input_schema_combines_parameters_and_body() {
        let schema = build_input_schema(&route());
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["id"]["type"], "integer");
        assert_eq!(
            schema["properties"]["notify"]["description"],
            "Send a notification email"
        );
        assert_eq!(schema["properties"]["body"]["type"], "string");
        let required = schema["required"].as_array().unwrap();
        assert!(required.contains(&json!("id")));
        assert!(required.contains(&json!("body")));
        assert!(!required.contains(&json!("notify")));
    }

    #[test]
    fn test_parameter_named_body_shadows_request_body() {
        let shadowed = RouteDescriptor::new(HttpMethod::Post, "/echo")
            .with_parameter(ParameterSpec::query("body", SchemaObject::string()))
            .with_request_body(RequestBodySpec::json(SchemaObject::integer()));
        let schema = build_input_schema(&shadowed);
        assert_eq!(schema["properties"]["body"]["type"], "string");
    }

    #[test]
    fn test_freeze_carries_draft_mutations() {
        let descriptor = Arc::new(route());
        let mut draft =
            CapabilityDraft::for_route(&descriptor, "update_user", BTreeSet::new());
        draft.title = "Renamed".to_string();
        draft.tags.insert("custom".to_string());

        let capability = draft.freeze(
            "update_user".to_string(),
            CapabilityKind::Action,
            descriptor.clone(),
        );
        assert_eq!(capability.title, "Renamed");
        assert!(capability.tags.contains("custom"));
        assert_eq!(capability.summary().identifier, "update_user");
        assert!(Arc::ptr_eq(&capability.descriptor, &descriptor));
    }
}
