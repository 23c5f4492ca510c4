//! Capability registry — identifier to capability, built once per
//! compilation run.
//!
//! Insertion order is source order, so listing is reproducible. After
//! compilation the registry is read-only for all consumers; concurrent
//! reads need no synchronization. `remove` exists for host housekeeping
//! and never invalidates in-flight invocations: descriptors are
//! `Arc`-owned by the capabilities that reference them.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use jsonschema::Validator;
use serde_json::Value;

use crate::capabilities::capability::{Capability, CapabilitySummary};
use crate::errors::ValidationError;

/// Mapping from identifier to compiled capability.
#[derive(Default)]
pub struct CapabilityRegistry {
    /// Capabilities in compilation (source) order.
    entries: IndexMap<String, Arc<Capability>>,
    /// Argument validators compiled from each capability's input schema.
    validators: HashMap<String, Validator>,
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("entries", &self.entries)
            .field("validators", &self.validators.keys())
            .finish()
    }
}

impl CapabilityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a compiled capability under its identifier.
    ///
    /// The name synthesizer guarantees identifiers are unique within one
    /// run, so insertion never overwrites an earlier entry.
    pub(crate) fn insert(&mut self, capability: Capability) {
        match Validator::new(&capability.input_schema) {
            Ok(validator) => {
                self.validators
                    .insert(capability.identifier.clone(), validator);
            }
            Err(e) => {
                log::warn!(
                    "capability '{}': input schema did not compile, arguments will not be validated: {}",
                    capability.identifier,
                    e
                );
            }
        }
        self.entries
            .insert(capability.identifier.clone(), Arc::new(capability));
    }

    /// Look up a capability by identifier.
    pub fn get(&self, identifier: &str) -> Option<&Arc<Capability>> {
        self.entries.get(identifier)
    }

    /// Whether an identifier is present.
    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    /// Number of compiled capabilities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry holds no capabilities.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identifiers in compilation order.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Summaries of every capability, in compilation order.
    pub fn list(&self) -> Vec<CapabilitySummary> {
        self.entries.values().map(|c| c.summary()).collect()
    }

    /// Remove a capability, preserving the order of the rest.
    ///
    /// Invocations already bound against the removed capability keep
    /// their `Arc`'d descriptor and complete normally.
    pub fn remove(&mut self, identifier: &str) -> Option<Arc<Capability>> {
        self.validators.remove(identifier);
        self.entries.shift_remove(identifier)
    }

    /// Validate an argument object against a capability's input schema.
    ///
    /// Identifiers without a compiled validator accept any arguments.
    ///
    /// # Errors
    ///
    /// `ValidationError` carrying the validator's own messages, joined.
    pub fn validate(&self, identifier: &str, arguments: &Value) -> Result<(), ValidationError> {
        if let Some(validator) = self.validators.get(identifier) {
            // Fast path for the common case of valid input.
            if !validator.is_valid(arguments) {
                let messages: Vec<String> = validator
                    .iter_errors(arguments)
                    .map(|e| format!("{}: {}", e.instance_path, e))
                    .collect();
                return Err(ValidationError {
                    message: messages.join("; "),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use serde_json::json;

    use crate::capabilities::capability::CapabilityDraft;
    use crate::compiler::rules::CapabilityKind;
    use crate::openapi::route::{HttpMethod, ParameterSpec, RouteDescriptor};
    use crate::openapi::schema::SchemaObject;

    fn capability(identifier: &str, path: &str) -> Capability {
        let descriptor = Arc::new(
            RouteDescriptor::new(HttpMethod::Get, path).with_parameter(
                ParameterSpec::query("limit", SchemaObject::integer()),
            ),
        );
        CapabilityDraft::for_route(&descriptor, identifier, BTreeSet::new()).freeze(
            identifier.to_string(),
            CapabilityKind::Action,
            descriptor,
        )
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let mut registry = CapabilityRegistry::new();
        registry.insert(capability("zeta", "/zeta"));
        registry.insert(capability("alpha", "/alpha"));

        let ids: Vec<_> = registry.list().into_iter().map(|s| s.identifier).collect();
        assert_eq!(ids, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_validate_rejects_wrong_type() {
        let mut registry = CapabilityRegistry::new();
        registry.insert(capability("list_users", "/users"));

        assert!(registry
            .validate("list_users", &json!({ "limit": 10 }))
            .is_ok());
        let err = registry
            .validate("list_users", &json!({ "limit": "ten" }))
            .unwrap_err();
        assert!(err.message.contains("limit"));
    }

    #[test]
    fn test_validate_without_validator_accepts_anything() {
        let registry = CapabilityRegistry::new();
        assert!(registry.validate("ghost", &json!({ "x": 1 })).is_ok());
    }

    #[test]
    fn test_remove_keeps_descriptor_alive_and_order() {
        let mut registry = CapabilityRegistry::new();
        registry.insert(capability("a", "/a"));
        registry.insert(capability("b", "/b"));
        registry.insert(capability("c", "/c"));

        let removed = registry.remove("b").unwrap();
        // An in-flight invocation bound against the removed capability
        // still holds a valid descriptor.
        assert_eq!(removed.descriptor.path_template, "/b");
        assert!(!registry.contains("b"));
        let ids: Vec<_> = registry.identifiers().collect();
        assert_eq!(ids, vec!["a", "c"]);
    }
}
