//! Identifier synthesis for compiled capabilities.
//!
//! Derives a sanitized, length-bounded, collision-free identifier for each
//! route: override table hit, or the operation id (or method+path fallback)
//! cut at its first `__` separator, slugified, truncated, and suffixed
//! `_2`, `_3`, ... on collision. For a fixed descriptor order the
//! assignment is reproducible across runs.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

/// Characters outside this class are replaced with `_`.
static INVALID_IDENTIFIER_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]").unwrap());

/// Hard bound on synthesized identifier length.
pub const MAX_IDENTIFIER_LENGTH: usize = 56;

/// Replace every character outside `[A-Za-z0-9_]` with an underscore.
pub fn slugify(name: &str) -> String {
    INVALID_IDENTIFIER_CHARS.replace_all(name, "_").into_owned()
}

// ---------------------------------------------------------------------------
// NameAllocator
// ---------------------------------------------------------------------------

/// Run-scoped identifier allocator.
///
/// Owns the set of identifiers already issued by one compilation run, so a
/// candidate that collides after slugification and truncation receives the
/// smallest free numeric suffix instead of overwriting an earlier entry.
#[derive(Debug, Default)]
pub struct NameAllocator {
    /// Per-operation overrides, keyed by exact operation id.
    overrides: HashMap<String, String>,
    /// Identifiers issued so far in this run.
    issued: HashSet<String>,
}

impl NameAllocator {
    /// Create an allocator with a per-operation override table.
    pub fn new(overrides: HashMap<String, String>) -> Self {
        Self {
            overrides,
            issued: HashSet::new(),
        }
    }

    /// Synthesize the identifier for one route.
    ///
    /// `operation_id` is the source-provided id when present; `fallback`
    /// is the method+path naming source used when it is absent. Overrides
    /// apply only on an exact `operation_id` match and still pass through
    /// slugification and truncation.
    pub fn allocate(&mut self, operation_id: Option<&str>, fallback: &str) -> String {
        let candidate = match operation_id.and_then(|id| self.overrides.get(id)) {
            Some(custom) => custom.clone(),
            None => {
                let source = operation_id.unwrap_or(fallback);
                match source.find("__") {
                    Some(cut) => source[..cut].to_string(),
                    None => source.to_string(),
                }
            }
        };

        let base = truncate(&slugify(&candidate), MAX_IDENTIFIER_LENGTH);

        if self.issued.insert(base.clone()) {
            return base;
        }

        // Collision: smallest integer suffix >= 2 that is still free.
        // The suffix is never trimmed; the base is.
        let mut counter: u64 = 2;
        loop {
            let suffix = format!("_{}", counter);
            let keep = MAX_IDENTIFIER_LENGTH.saturating_sub(suffix.len());
            let candidate = format!("{}{}", truncate(&base, keep), suffix);
            if self.issued.insert(candidate.clone()) {
                return candidate;
            }
            counter += 1;
        }
    }
}

fn truncate(name: &str, max_length: usize) -> String {
    // Slugified names are pure ASCII, so byte indexing is char-safe.
    if name.len() > max_length {
        name[..max_length].to_string()
    } else {
        name.to_string()
    }
}
