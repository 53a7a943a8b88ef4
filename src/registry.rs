//! Reference registry
//!
//! A field such as a role name is a foreign key to an entity the remote API
//! identifies by an opaque id the user never supplies. The registry binds
//! (category, scope, name) to the backend identifier, is rebuilt by walking
//! the full tree before and after resolution, and lives only for the
//! duration of one operation.

use std::collections::{BTreeMap, HashSet};

use modelkit::{Diagnostics, Value};

/// A name -> backend-identifier binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Referenceable entity kind, e.g. "role" or "template"
    pub category: String,
    /// Namespace within which names and ids are unique
    pub scope: String,
    /// Backend identifier; unset or pending until the server assigns it
    pub id: Value<String>,
    /// User-chosen name
    pub name: String,
}

/// Outcome of resolving a reference during serialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The backend identifier is known
    Id(String),
    /// The id is not yet known; the marker asks the transport to resolve the
    /// entity by name server-side
    Deferred(String),
    /// The id is unknown and the category cannot resolve by name
    Unresolved,
}

/// Prefix of deferred resolve-by-name markers
const DEFERRED_PREFIX: &str = "@name:";

/// Build the marker the transport interprets as "resolve by name"
pub fn deferred_marker(category: &str, name: &str) -> String {
    format!("{DEFERRED_PREFIX}{category}/{name}")
}

/// Split a deferred marker back into (category, name), if it is one
pub fn parse_deferred_marker(value: &str) -> Option<(&str, &str)> {
    value
        .strip_prefix(DEFERRED_PREFIX)
        .and_then(|rest| rest.split_once('/'))
}

/// category -> (scope, name) -> Reference, rebuilt per collect pass
///
/// `BTreeMap` keeps lookups and iteration deterministic: repeated runs on
/// the same tree produce identical resolutions.
#[derive(Debug, Default)]
pub struct ReferenceRegistry {
    entries: BTreeMap<String, BTreeMap<(String, String), Reference>>,
    name_resolvable: HashSet<String>,
}

impl ReferenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare which categories the transport can resolve by name
    pub fn with_name_resolution(categories: &[&str]) -> Self {
        Self {
            entries: BTreeMap::new(),
            name_resolvable: categories.iter().map(|c| (*c).to_string()).collect(),
        }
    }

    /// Drop all bindings ahead of a collect pass re-walking the tree
    pub fn begin_rebuild(&mut self) {
        log::debug!("rebuilding reference registry ({} categories)", self.entries.len());
        self.entries.clear();
    }

    /// Register an entity under (category, scope, name).
    ///
    /// A second registration of the same key within one rebuild is a usage
    /// error: exactly one diagnostic is recorded and the first registration
    /// wins, keeping lookups deterministic.
    pub fn register(
        &mut self,
        category: &str,
        scope: &str,
        name: &str,
        id: Value<String>,
        diagnostics: &mut Diagnostics,
    ) {
        let key = (scope.to_string(), name.to_string());
        let bindings = self.entries.entry(category.to_string()).or_default();
        if bindings.contains_key(&key) {
            diagnostics.error(
                "duplicate reference name",
                format!("{category} `{name}` is declared more than once in scope `{scope}`"),
            );
            return;
        }
        log::debug!("registered {category} `{name}` in scope `{scope}` (id known: {})", id.is_present());
        bindings.insert(
            key,
            Reference {
                category: category.to_string(),
                scope: scope.to_string(),
                id,
                name: name.to_string(),
            },
        );
    }

    /// Look up a binding by name
    pub fn lookup(&self, category: &str, scope: &str, name: &str) -> Option<&Reference> {
        self.entries
            .get(category)?
            .get(&(scope.to_string(), name.to_string()))
    }

    /// The backend id bound to a name, when already known
    pub fn resolved_id(&self, category: &str, scope: &str, name: &str) -> Option<String> {
        self.lookup(category, scope, name)
            .and_then(|reference| reference.id.to_present())
    }

    /// Whether a value is already a known backend id in the category
    pub fn is_known_id(&self, category: &str, scope: &str, value: &str) -> bool {
        self.entries.get(category).is_some_and(|bindings| {
            bindings
                .values()
                .any(|r| r.scope == scope && r.id.as_present().map(String::as_str) == Some(value))
        })
    }

    /// Resolve a reference-holding field value during serialization.
    ///
    /// A known name with a known id resolves to the id. A value that already
    /// is a known id passes through unchanged (the field was rewritten by a
    /// previous operation). Anything else is a lookup miss: a deferred
    /// marker when the category supports resolve-by-name, `Unresolved`
    /// otherwise.
    pub fn resolve(&self, category: &str, scope: &str, value: &str) -> Resolution {
        if let Some(reference) = self.lookup(category, scope, value) {
            if let Some(id) = reference.id.to_present() {
                return Resolution::Id(id);
            }
        } else if self.is_known_id(category, scope, value) {
            return Resolution::Id(value.to_string());
        }
        if self.name_resolvable.contains(category) {
            Resolution::Deferred(deferred_marker(category, value))
        } else {
            Resolution::Unresolved
        }
    }
}
