//! Loader for resolved OpenAPI 3.x documents.
//!
//! Converts a source document — with `$ref`s already resolved and
//! parameter definitions inlined — into an ordered sequence of
//! `RouteDescriptor` values. Structural problems surface as `SpecError`;
//! a document that loads cleanly is guaranteed bindable.

use serde_json::Value;

use crate::errors::SpecError;
use crate::openapi::route::{
    HttpMethod, ParameterLocation, ParameterSpec, RequestBodySpec, RouteDescriptor,
};
use crate::openapi::schema::SchemaObject;

/// Operation keys of a path item, in the order the OpenAPI specification
/// lists them. Fixed so descriptor order is reproducible across runs.
const OPERATION_KEYS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Load route descriptors from a resolved OpenAPI document.
///
/// Paths are walked in document order, and operations within a path item
/// in the specification's verb order. Every descriptor is validated
/// before any is returned.
///
/// # Errors
///
/// `SpecError::Document` for a malformed document, or the first
/// structural invariant violated by any operation.
pub fn load_routes(document: &Value) -> Result<Vec<RouteDescriptor>, SpecError> {
    let paths = document
        .get("paths")
        .and_then(Value::as_object)
        .ok_or_else(|| SpecError::Document {
            message: "missing 'paths' object".to_string(),
        })?;

    let mut routes = Vec::new();

    for (path_template, item) in paths {
        let item = item.as_object().ok_or_else(|| SpecError::Document {
            message: format!("path item '{}' is not an object", path_template),
        })?;

        // Path-item-level parameters apply to every operation beneath it;
        // an operation-level parameter with the same (name, in) overrides.
        let shared_parameters = item
            .get("parameters")
            .map(|p| parse_parameters(path_template, p))
            .transpose()?
            .unwrap_or_default();

        for key in OPERATION_KEYS {
            let Some(operation) = item.get(key) else {
                continue;
            };
            let method = HttpMethod::from_str_opt(key).ok_or_else(|| SpecError::Document {
                message: format!("unsupported method '{}' on '{}'", key, path_template),
            })?;
            let route =
                parse_operation(method, path_template, operation, &shared_parameters)?;
            route.validate()?;
            routes.push(route);
        }
    }

    log::debug!("loaded {} route(s) from document", routes.len());
    Ok(routes)
}

/// Load route descriptors from OpenAPI JSON text.
///
/// # Errors
///
/// `SpecError::Document` when the text is not valid JSON, plus everything
/// `load_routes` reports.
pub fn load_routes_from_str(text: &str) -> Result<Vec<RouteDescriptor>, SpecError> {
    let document: Value = serde_json::from_str(text).map_err(|e| SpecError::Document {
        message: e.to_string(),
    })?;
    load_routes(&document)
}

fn parse_operation(
    method: HttpMethod,
    path_template: &str,
    operation: &Value,
    shared_parameters: &[ParameterSpec],
) -> Result<RouteDescriptor, SpecError> {
    let obj = operation.as_object().ok_or_else(|| SpecError::Document {
        message: format!("operation {} {} is not an object", method, path_template),
    })?;

    let mut route = RouteDescriptor::new(method, path_template);

    route.operation_id = obj
        .get("operationId")
        .and_then(Value::as_str)
        .map(str::to_string);
    route.summary = obj
        .get("summary")
        .and_then(Value::as_str)
        .map(str::to_string);
    route.description = obj
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string);

    if let Some(tags) = obj.get("tags").and_then(Value::as_array) {
        route.tags = tags
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
    }

    let own_parameters = obj
        .get("parameters")
        .map(|p| parse_parameters(path_template, p))
        .transpose()?
        .unwrap_or_default();

    // Shared parameters first, unless shadowed by an operation-level one.
    for shared in shared_parameters {
        let shadowed = own_parameters
            .iter()
            .any(|own| own.name == shared.name && own.location == shared.location);
        if !shadowed {
            route.parameters.push(shared.clone());
        }
    }
    route.parameters.extend(own_parameters);

    route.request_body = parse_request_body(obj.get("requestBody"));

    Ok(route)
}

fn parse_parameters(
    path_template: &str,
    parameters: &Value,
) -> Result<Vec<ParameterSpec>, SpecError> {
    let list = parameters.as_array().ok_or_else(|| SpecError::Document {
        message: format!("'parameters' on '{}' is not an array", path_template),
    })?;

    let mut specs = Vec::with_capacity(list.len());
    for entry in list {
        let obj = entry.as_object().ok_or_else(|| SpecError::Document {
            message: format!("parameter entry on '{}' is not an object", path_template),
        })?;

        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| SpecError::Document {
                message: format!("parameter on '{}' has no name", path_template),
            })?;

        let location = match obj.get("in").and_then(Value::as_str) {
            Some("path") => ParameterLocation::Path,
            Some("query") => ParameterLocation::Query,
            Some("header") => ParameterLocation::Header,
            // Cookie parameters and other locations are not part of the
            // capability surface; the loader drops them.
            Some(_) => continue,
            None => {
                return Err(SpecError::Document {
                    message: format!(
                        "parameter '{}' on '{}' has no location",
                        name, path_template
                    ),
                })
            }
        };

        let schema = obj
            .get("schema")
            .map(SchemaObject::from_document)
            .unwrap_or_default();

        let mut spec = ParameterSpec {
            name: name.to_string(),
            location,
            required: obj.get("required").and_then(Value::as_bool).unwrap_or(false),
            schema,
            explode: obj.get("explode").and_then(Value::as_bool).unwrap_or(true),
            description: obj
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
        };
        // Path parameters are required whether or not the document says so;
        // validate() rejects an explicit `required: false`.
        if location == ParameterLocation::Path && obj.get("required").is_none() {
            spec.required = true;
        }
        specs.push(spec);
    }
    Ok(specs)
}

fn parse_request_body(body: Option<&Value>) -> Option<RequestBodySpec> {
    let obj = body?.as_object()?;
    let content = obj.get("content")?.as_object()?;

    // Prefer application/json; otherwise take the first declared media type.
    let (content_type, media) = content
        .get_key_value("application/json")
        .or_else(|| content.iter().next())?;

    let schema = media
        .get("schema")
        .map(SchemaObject::from_document)
        .unwrap_or_default();

    Some(RequestBodySpec {
        schema,
        required: obj.get("required").and_then(Value::as_bool).unwrap_or(false),
        content_type: content_type.clone(),
    })
}
