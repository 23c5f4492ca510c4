//! Route classification rules.
//!
//! A rule chain is an ordered list: user-supplied rules first, in the
//! order given, then the built-in defaults. The first rule whose method
//! selector, path pattern, and required tags all match a route decides its
//! capability kind and contributes extra tags; later rules are not
//! consulted. An optional override hook then gets the last word.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::openapi::route::{HttpMethod, RouteDescriptor};

// ---------------------------------------------------------------------------
// CapabilityKind
// ---------------------------------------------------------------------------

/// What a classified route becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    /// Callable action with side effects.
    Action,
    /// Readable resource with a fixed address.
    Readable,
    /// Readable resource parameterized by path placeholders.
    ReadableTemplate,
    /// Dropped from the compiled surface entirely.
    Excluded,
}

impl CapabilityKind {
    /// Lowercase wire form of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityKind::Action => "action",
            CapabilityKind::Readable => "readable",
            CapabilityKind::ReadableTemplate => "readable_template",
            CapabilityKind::Excluded => "excluded",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// MethodSelector
// ---------------------------------------------------------------------------

/// Which HTTP verbs a rule applies to.
#[derive(Debug, Clone)]
pub enum MethodSelector {
    /// Any verb.
    Any,
    /// Only the listed verbs.
    Only(BTreeSet<HttpMethod>),
}

impl MethodSelector {
    /// Selector for an explicit verb list.
    pub fn only(methods: impl IntoIterator<Item = HttpMethod>) -> Self {
        MethodSelector::Only(methods.into_iter().collect())
    }

    /// Whether the selector admits the given verb.
    pub fn matches(&self, method: HttpMethod) -> bool {
        match self {
            MethodSelector::Any => true,
            MethodSelector::Only(methods) => methods.contains(&method),
        }
    }
}

// ---------------------------------------------------------------------------
// PathPattern
// ---------------------------------------------------------------------------

/// Pattern tested against the literal path template.
///
/// Matching is search-style (a match anywhere in the template counts) and
/// runs against the template string itself, braces included, so rules can
/// key on path shape — e.g. `r"\{"` matches every parameterized path.
#[derive(Debug, Clone)]
pub enum PathPattern {
    /// Any path.
    Any,
    /// Paths whose template contains a match of the regex.
    Matches(Regex),
}

impl PathPattern {
    /// Compile a regex pattern.
    ///
    /// # Errors
    ///
    /// Returns the underlying regex error for an invalid pattern.
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Ok(PathPattern::Matches(Regex::new(pattern)?))
    }

    /// Whether the pattern matches the given path template.
    pub fn is_match(&self, path_template: &str) -> bool {
        match self {
            PathPattern::Any => true,
            PathPattern::Matches(regex) => regex.is_match(path_template),
        }
    }
}

// ---------------------------------------------------------------------------
// MappingRule
// ---------------------------------------------------------------------------

/// One entry in the classification chain.
#[derive(Debug, Clone)]
pub struct MappingRule {
    /// Verbs the rule applies to.
    pub methods: MethodSelector,
    /// Pattern over the literal path template.
    pub path_pattern: PathPattern,
    /// Tags that must all be present on the route. Empty = no constraint.
    pub required_tags: BTreeSet<String>,
    /// Kind assigned on match.
    pub kind: CapabilityKind,
    /// Tags merged into the resulting capability.
    pub extra_tags: BTreeSet<String>,
}

impl MappingRule {
    /// Catch-all rule assigning the given kind.
    pub fn new(kind: CapabilityKind) -> Self {
        Self {
            methods: MethodSelector::Any,
            path_pattern: PathPattern::Any,
            required_tags: BTreeSet::new(),
            kind,
            extra_tags: BTreeSet::new(),
        }
    }

    /// Builder: restrict to the listed verbs.
    pub fn with_methods(mut self, methods: impl IntoIterator<Item = HttpMethod>) -> Self {
        self.methods = MethodSelector::only(methods);
        self
    }

    /// Builder: set the path pattern from a regex.
    ///
    /// # Errors
    ///
    /// Returns the underlying regex error for an invalid pattern.
    pub fn with_path_pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.path_pattern = PathPattern::regex(pattern)?;
        Ok(self)
    }

    /// Builder: require a tag on the route.
    pub fn with_required_tag(mut self, tag: impl Into<String>) -> Self {
        self.required_tags.insert(tag.into());
        self
    }

    /// Builder: merge a tag into matched capabilities.
    pub fn with_extra_tag(mut self, tag: impl Into<String>) -> Self {
        self.extra_tags.insert(tag.into());
        self
    }

    /// Whether every selector of this rule admits the route.
    pub fn matches(&self, route: &RouteDescriptor) -> bool {
        self.methods.matches(route.method)
            && self.path_pattern.is_match(&route.path_template)
            && self
                .required_tags
                .iter()
                .all(|tag| route.tags.contains(tag))
    }
}

/// Built-in default chain: one catch-all rule assigning `Action`, so every
/// route is classified unless a user rule or the override excludes it. A
/// user-supplied catch-all placed before this suppresses it entirely;
/// that ordering semantics is deliberate and load-bearing.
static DEFAULT_RULES: Lazy<Vec<MappingRule>> =
    Lazy::new(|| vec![MappingRule::new(CapabilityKind::Action)]);

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Hook with the final say over a route's kind. `Some` replaces the chain
/// decision — including forcing or lifting exclusion — `None` defers.
pub type RouteOverrideFn =
    Arc<dyn Fn(&RouteDescriptor, CapabilityKind) -> Option<CapabilityKind> + Send + Sync>;

/// Classify one route against user rules, the built-in defaults, and the
/// optional override hook.
///
/// Returns `None` when the final kind is `Excluded`: the route produces
/// no capability and is dropped before naming.
pub fn classify(
    route: &RouteDescriptor,
    user_rules: &[MappingRule],
    route_override: Option<&RouteOverrideFn>,
) -> Option<(CapabilityKind, BTreeSet<String>)> {
    // The default catch-all guarantees a match exists.
    let matched = user_rules
        .iter()
        .chain(DEFAULT_RULES.iter())
        .find(|rule| rule.matches(route))?;

    let mut kind = matched.kind;
    if let Some(hook) = route_override {
        if let Some(forced) = hook(route, kind) {
            kind = forced;
        }
    }

    if kind == CapabilityKind::Excluded {
        log::debug!(
            "route {} {} excluded from compilation",
            route.method,
            route.path_template
        );
        return None;
    }
    Some((kind, matched.extra_tags.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi::route::HttpMethod;

    fn get_user() -> RouteDescriptor {
        RouteDescriptor::new(HttpMethod::Get, "/users/{id}").with_operation_id("get_user")
    }

    fn list_users() -> RouteDescriptor {
        RouteDescriptor::new(HttpMethod::Get, "/users").with_operation_id("list_users")
    }

    #[test]
    fn test_default_chain_assigns_action() {
        let (kind, extra) = classify(&get_user(), &[], None).unwrap();
        assert_eq!(kind, CapabilityKind::Action);
        assert!(extra.is_empty());
    }

    #[test]
    fn test_custom_rule_wins_over_default() {
        let rules = vec![MappingRule::new(CapabilityKind::ReadableTemplate)
            .with_methods([HttpMethod::Get])
            .with_path_pattern(r"\{")
            .unwrap()];

        let (kind, _) = classify(&get_user(), &rules, None).unwrap();
        assert_eq!(kind, CapabilityKind::ReadableTemplate);

        // The non-parameterized path falls through to the default.
        let (kind, _) = classify(&list_users(), &rules, None).unwrap();
        assert_eq!(kind, CapabilityKind::Action);
    }

    #[test]
    fn test_first_match_wins_within_user_rules() {
        let rules = vec![
            MappingRule::new(CapabilityKind::Readable).with_methods([HttpMethod::Get]),
            MappingRule::new(CapabilityKind::Excluded),
        ];
        let (kind, _) = classify(&list_users(), &rules, None).unwrap();
        assert_eq!(kind, CapabilityKind::Readable);
    }

    #[test]
    fn test_user_catch_all_suppresses_defaults() {
        // A trailing catch-all replaces the built-in Action default for
        // everything the earlier rules did not claim.
        let rules = vec![
            MappingRule::new(CapabilityKind::Readable)
                .with_path_pattern(r"^/health$")
                .unwrap(),
            MappingRule::new(CapabilityKind::Excluded),
        ];
        assert!(classify(&get_user(), &rules, None).is_none());
        assert!(classify(&list_users(), &rules, None).is_none());

        let health = RouteDescriptor::new(HttpMethod::Get, "/health");
        let (kind, _) = classify(&health, &rules, None).unwrap();
        assert_eq!(kind, CapabilityKind::Readable);
    }

    #[test]
    fn test_required_tags_all_must_match() {
        let rules = vec![MappingRule::new(CapabilityKind::Readable)
            .with_required_tag("public")
            .with_required_tag("v2")];

        let tagged = list_users().with_tag("public").with_tag("v2").with_tag("beta");
        let (kind, _) = classify(&tagged, &rules, None).unwrap();
        assert_eq!(kind, CapabilityKind::Readable);

        let partial = list_users().with_tag("public");
        let (kind, _) = classify(&partial, &rules, None).unwrap();
        assert_eq!(kind, CapabilityKind::Action);
    }

    #[test]
    fn test_pattern_sees_literal_template_braces() {
        // Shape-based rule: matching runs on the template, not a resolved
        // path, so `\{` distinguishes parameterized routes.
        let rule = MappingRule::new(CapabilityKind::ReadableTemplate)
            .with_path_pattern(r"\{")
            .unwrap();
        assert!(rule.matches(&get_user()));
        assert!(!rule.matches(&list_users()));
    }

    #[test]
    fn test_extra_tags_flow_from_matched_rule() {
        let rules = vec![MappingRule::new(CapabilityKind::Readable)
            .with_extra_tag("compiled")
            .with_extra_tag("read-side")];
        let (_, extra) = classify(&list_users(), &rules, None).unwrap();
        assert_eq!(
            extra,
            BTreeSet::from(["compiled".to_string(), "read-side".to_string()])
        );
    }

    #[test]
    fn test_override_replaces_chain_decision() {
        let force_readable: RouteOverrideFn =
            Arc::new(|_, _| Some(CapabilityKind::Readable));
        let (kind, _) = classify(&list_users(), &[], Some(&force_readable)).unwrap();
        assert_eq!(kind, CapabilityKind::Readable);
    }

    #[test]
    fn test_override_can_force_exclusion() {
        let exclude_users: RouteOverrideFn = Arc::new(|route, _| {
            route
                .path_template
                .starts_with("/users")
                .then_some(CapabilityKind::Excluded)
        });
        assert!(classify(&list_users(), &[], Some(&exclude_users)).is_none());
    }

    #[test]
    fn test_override_can_lift_exclusion() {
        let rules = vec![MappingRule::new(CapabilityKind::Excluded)];
        let rescue: RouteOverrideFn = Arc::new(|_, kind| {
            (kind == CapabilityKind::Excluded).then_some(CapabilityKind::Action)
        });
        let (kind, _) = classify(&list_users(), &rules, Some(&rescue)).unwrap();
        assert_eq!(kind, CapabilityKind::Action);
    }

    #[test]
    fn test_override_none_defers_to_chain() {
        let noop: RouteOverrideFn = Arc::new(|_, _| None);
        let (kind, _) = classify(&list_users(), &[], Some(&noop)).unwrap();
        assert_eq!(kind, CapabilityKind::Action);
    }
}
