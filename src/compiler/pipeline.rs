//! The compilation pipeline: descriptors in, registry out.
//!
//! For each descriptor in source order: classify, synthesize an
//! identifier, instantiate a draft, run the customization hook, freeze,
//! insert. Compilation is synchronous, pure, and all-or-nothing — the
//! first structural error aborts the run and no registry is produced.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::capabilities::capability::CapabilityDraft;
use crate::capabilities::registry::CapabilityRegistry;
use crate::compiler::naming::NameAllocator;
use crate::compiler::rules::{classify, CapabilityKind, MappingRule, RouteOverrideFn};
use crate::errors::SpecError;
use crate::openapi::document::load_routes;
use crate::openapi::route::RouteDescriptor;

/// Hook mutating a freshly instantiated capability in place. Runs exactly
/// once per capability, before the draft is frozen; its return value is
/// ignored by construction.
pub type CustomizeFn = Arc<dyn Fn(&RouteDescriptor, &mut CapabilityDraft) + Send + Sync>;

// ---------------------------------------------------------------------------
// CompileOptions
// ---------------------------------------------------------------------------

/// Configuration surface of one compilation run.
///
/// All inputs are pure data or stateless functions; compilation reads no
/// environment and touches no filesystem.
#[derive(Clone, Default)]
pub struct CompileOptions {
    /// User rules, evaluated before the built-in defaults, in this order.
    pub rules: Vec<MappingRule>,
    /// Final-say hook over each route's kind.
    pub route_override: Option<RouteOverrideFn>,
    /// Per-operation identifier overrides, keyed by exact operation id.
    pub name_overrides: HashMap<String, String>,
    /// Tags applied to every compiled capability.
    pub global_tags: BTreeSet<String>,
    /// In-place customization hook.
    pub customize: Option<CustomizeFn>,
}

impl fmt::Debug for CompileOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompileOptions")
            .field("rules", &self.rules)
            .field("route_override", &self.route_override.as_ref().map(|_| "<hook>"))
            .field("name_overrides", &self.name_overrides)
            .field("global_tags", &self.global_tags)
            .field("customize", &self.customize.as_ref().map(|_| "<hook>"))
            .finish()
    }
}

impl CompileOptions {
    /// Create empty options: default rules only, no hooks, no tags.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: append a classification rule.
    pub fn with_rule(mut self, rule: MappingRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Builder: set the kind-override hook.
    pub fn with_route_override<F>(mut self, hook: F) -> Self
    where
        F: Fn(&RouteDescriptor, CapabilityKind) -> Option<CapabilityKind> + Send + Sync + 'static,
    {
        self.route_override = Some(Arc::new(hook));
        self
    }

    /// Builder: map an operation id to a custom identifier.
    pub fn with_name_override(
        mut self,
        operation_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        self.name_overrides.insert(operation_id.into(), name.into());
        self
    }

    /// Builder: add a tag applied to every compiled capability.
    pub fn with_global_tag(mut self, tag: impl Into<String>) -> Self {
        self.global_tags.insert(tag.into());
        self
    }

    /// Builder: set the customization hook.
    pub fn with_customize<F>(mut self, hook: F) -> Self
    where
        F: Fn(&RouteDescriptor, &mut CapabilityDraft) + Send + Sync + 'static,
    {
        self.customize = Some(Arc::new(hook));
        self
    }
}

// ---------------------------------------------------------------------------
// compile
// ---------------------------------------------------------------------------

/// Compile descriptors into a capability registry.
///
/// # Errors
///
/// The first `SpecError` found. Every descriptor is checked before any
/// capability is built, so a failed run has no observable partial state.
pub fn compile(
    descriptors: Vec<RouteDescriptor>,
    options: &CompileOptions,
) -> Result<CapabilityRegistry, SpecError> {
    for descriptor in &descriptors {
        descriptor.validate()?;
    }

    let mut seen_operation_ids = HashSet::new();
    for descriptor in &descriptors {
        if let Some(operation_id) = &descriptor.operation_id {
            if !seen_operation_ids.insert(operation_id.clone()) {
                return Err(SpecError::DuplicateOperationId {
                    operation_id: operation_id.clone(),
                });
            }
        }
    }

    let mut names = NameAllocator::new(options.name_overrides.clone());
    let mut registry = CapabilityRegistry::new();

    for descriptor in descriptors {
        let descriptor = Arc::new(descriptor);

        let Some((kind, extra_tags)) = classify(
            &descriptor,
            &options.rules,
            options.route_override.as_ref(),
        ) else {
            continue;
        };

        let identifier = names.allocate(
            descriptor.operation_id.as_deref(),
            &descriptor.fallback_name(),
        );

        let mut tags = extra_tags;
        tags.extend(options.global_tags.iter().cloned());

        let mut draft = CapabilityDraft::for_route(&descriptor, &identifier, tags);
        if let Some(hook) = &options.customize {
            hook(&descriptor, &mut draft);
        }

        log::debug!(
            "compiled {} {} as {} '{}'",
            descriptor.method,
            descriptor.path_template,
            kind,
            identifier
        );
        registry.insert(draft.freeze(identifier, kind, descriptor));
    }

    log::info!("compiled {} capabilit(ies)", registry.len());
    Ok(registry)
}

/// Load a resolved OpenAPI document and compile it in one step.
///
/// # Errors
///
/// Everything `load_routes` and `compile` report.
pub fn compile_document(
    document: &Value,
    options: &CompileOptions,
) -> Result<CapabilityRegistry, SpecError> {
    let routes = load_routes(document)?;
    compile(routes, options)
}
