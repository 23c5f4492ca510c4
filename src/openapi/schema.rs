//! Explicit schema description values for parameters and request bodies.
//!
//! A schema is a tagged value over primitive, array, object, enum, and
//! union kinds, built once when the API document is loaded. Downstream
//! consumers lower it to JSON Schema: the registry compiles argument
//! validators from it, and each capability exposes it as its input schema.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

// ---------------------------------------------------------------------------
// SchemaObject
// ---------------------------------------------------------------------------

/// Schema description for one parameter or request body.
///
/// Constraints that the source document does not state are `None` and
/// impose nothing. `Any` accepts every value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SchemaObject {
    /// UTF-8 string with optional format and length/pattern constraints.
    String {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_length: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<u64>,
    },
    /// Whole number with optional bounds.
    Integer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        maximum: Option<i64>,
    },
    /// Floating-point number with optional bounds.
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        maximum: Option<f64>,
    },
    /// Boolean.
    Boolean,
    /// Homogeneous array; `items` of `None` means untyped elements.
    Array {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        items: Option<Box<SchemaObject>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_items: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_items: Option<u64>,
    },
    /// Object with named properties and a required set.
    Object {
        #[serde(default)]
        properties: BTreeMap<String, SchemaObject>,
        #[serde(default)]
        required: BTreeSet<String>,
    },
    /// Closed set of literal values.
    Enum { values: Vec<Value> },
    /// Value matching any one of the variants.
    Union { variants: Vec<SchemaObject> },
    /// Unconstrained.
    Any,
}

impl Default for SchemaObject {
    fn default() -> Self {
        SchemaObject::Any
    }
}

impl SchemaObject {
    /// Shorthand for an unconstrained string schema.
    pub fn string() -> Self {
        SchemaObject::String {
            format: None,
            pattern: None,
            min_length: None,
            max_length: None,
        }
    }

    /// Shorthand for an unconstrained integer schema.
    pub fn integer() -> Self {
        SchemaObject::Integer {
            minimum: None,
            maximum: None,
        }
    }

    /// Shorthand for an array of the given element schema.
    pub fn array_of(items: SchemaObject) -> Self {
        SchemaObject::Array {
            items: Some(Box::new(items)),
            min_items: None,
            max_items: None,
        }
    }

    /// Whether this schema describes an array value. Used by the binder
    /// to pick simple/explode serialization.
    pub fn is_array(&self) -> bool {
        matches!(self, SchemaObject::Array { .. })
    }

    /// Convert a resolved OpenAPI schema fragment into a description value.
    ///
    /// The loader guarantees `$ref`s are already inlined; anything this
    /// conversion does not recognize degrades to `Any` rather than failing,
    /// matching how the source system treats exotic schema keywords.
    pub fn from_document(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return SchemaObject::Any;
        };

        // An enum keyword wins over the declared primitive type.
        if let Some(values) = obj.get("enum").and_then(Value::as_array) {
            return SchemaObject::Enum {
                values: values.clone(),
            };
        }

        // oneOf / anyOf become a union over the converted variants.
        for keyword in ["oneOf", "anyOf"] {
            if let Some(variants) = obj.get(keyword).and_then(Value::as_array) {
                return SchemaObject::Union {
                    variants: variants.iter().map(SchemaObject::from_document).collect(),
                };
            }
        }

        match obj.get("type").and_then(Value::as_str) {
            Some("string") => SchemaObject::String {
                format: obj
                    .get("format")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                pattern: obj
                    .get("pattern")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                min_length: obj.get("minLength").and_then(Value::as_u64),
                max_length: obj.get("maxLength").and_then(Value::as_u64),
            },
            Some("integer") => SchemaObject::Integer {
                minimum: obj.get("minimum").and_then(Value::as_i64),
                maximum: obj.get("maximum").and_then(Value::as_i64),
            },
            Some("number") => SchemaObject::Number {
                minimum: obj.get("minimum").and_then(Value::as_f64),
                maximum: obj.get("maximum").and_then(Value::as_f64),
            },
            Some("boolean") => SchemaObject::Boolean,
            Some("array") => SchemaObject::Array {
                items: obj
                    .get("items")
                    .map(|items| Box::new(SchemaObject::from_document(items))),
                min_items: obj.get("minItems").and_then(Value::as_u64),
                max_items: obj.get("maxItems").and_then(Value::as_u64),
            },
            Some("object") => SchemaObject::Object {
                properties: obj
                    .get("properties")
                    .and_then(Value::as_object)
                    .map(|props| {
                        props
                            .iter()
                            .map(|(name, schema)| {
                                (name.clone(), SchemaObject::from_document(schema))
                            })
                            .collect()
                    })
                    .unwrap_or_default(),
                required: obj
                    .get("required")
                    .and_then(Value::as_array)
                    .map(|names| {
                        names
                            .iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            _ => SchemaObject::Any,
        }
    }

    /// Lower this description to a JSON Schema fragment.
    pub fn to_json_schema(&self) -> Value {
        match self {
            SchemaObject::String {
                format,
                pattern,
                min_length,
                max_length,
            } => {
                let mut out = Map::new();
                out.insert("type".into(), json!("string"));
                if let Some(format) = format {
                    out.insert("format".into(), json!(format));
                }
                if let Some(pattern) = pattern {
                    out.insert("pattern".into(), json!(pattern));
                }
                if let Some(min) = min_length {
                    out.insert("minLength".into(), json!(min));
                }
                if let Some(max) = max_length {
                    out.insert("maxLength".into(), json!(max));
                }
                Value::Object(out)
            }
            SchemaObject::Integer { minimum, maximum } => {
                let mut out = Map::new();
                out.insert("type".into(), json!("integer"));
                if let Some(min) = minimum {
                    out.insert("minimum".into(), json!(min));
                }
                if let Some(max) = maximum {
                    out.insert("maximum".into(), json!(max));
                }
                Value::Object(out)
            }
            SchemaObject::Number { minimum, maximum } => {
                let mut out = Map::new();
                out.insert("type".into(), json!("number"));
                if let Some(min) = minimum {
                    out.insert("minimum".into(), json!(min));
                }
                if let Some(max) = maximum {
                    out.insert("maximum".into(), json!(max));
                }
                Value::Object(out)
            }
            SchemaObject::Boolean => json!({ "type": "boolean" }),
            SchemaObject::Array {
                items,
                min_items,
                max_items,
            } => {
                let mut out = Map::new();
                out.insert("type".into(), json!("array"));
                if let Some(items) = items {
                    out.insert("items".into(), items.to_json_schema());
                }
                if let Some(min) = min_items {
                    out.insert("minItems".into(), json!(min));
                }
                if let Some(max) = max_items {
                    out.insert("maxItems".into(), json!(max));
                }
                Value::Object(out)
            }
            SchemaObject::Object {
                properties,
                required,
            } => {
                let mut out = Map::new();
                out.insert("type".into(), json!("object"));
                if !properties.is_empty() {
                    let props: Map<String, Value> = properties
                        .iter()
                        .map(|(name, schema)| (name.clone(), schema.to_json_schema()))
                        .collect();
                    out.insert("properties".into(), Value::Object(props));
                }
                if !required.is_empty() {
                    out.insert(
                        "required".into(),
                        Value::Array(required.iter().map(|n| json!(n)).collect()),
                    );
                }
                Value::Object(out)
            }
            SchemaObject::Enum { values } => json!({ "enum": values }),
            SchemaObject::Union { variants } => json!({
                "anyOf": variants
                    .iter()
                    .map(SchemaObject::to_json_schema)
                    .collect::<Vec<_>>()
            }),
            SchemaObject::Any => json!({}),
        }
    }
}
