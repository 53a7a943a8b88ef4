//! Per-operation handler
//!
//! Bundles the execution scope, the diagnostics sink, and the reference
//! registry for one create/read/update/delete operation. Allocated fresh per
//! operation and discarded at the end; nothing here is retained or shared,
//! so no synchronization is needed.

use modelkit::{Diagnostics, Value};

use crate::registry::{ReferenceRegistry, Resolution};

/// Operation-scoped context threaded through the conversion protocol
#[derive(Debug)]
pub struct Handler {
    scope: String,
    pub diagnostics: Diagnostics,
    pub registry: ReferenceRegistry,
}

impl Handler {
    pub fn new(scope: impl Into<String>, registry: ReferenceRegistry) -> Self {
        Self {
            scope: scope.into(),
            diagnostics: Diagnostics::new(),
            registry,
        }
    }

    /// The namespace this operation runs in (e.g. one managed project)
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Clear registry bindings ahead of a collect pass
    pub fn begin_rebuild(&mut self) {
        self.registry.begin_rebuild();
    }

    /// Register a referenceable entity in this operation's scope
    pub fn register(&mut self, category: &str, name: &str, id: Value<String>) {
        self.registry
            .register(category, &self.scope, name, id, &mut self.diagnostics);
    }

    /// Resolve a reference-holding field value for serialization.
    ///
    /// Returns the backend id when known, a deferred resolve-by-name marker
    /// when the category supports it, or `None` with a diagnostic recorded
    /// when the reference cannot be expressed at all.
    pub fn resolve(&mut self, category: &str, value: &str) -> Option<String> {
        match self.registry.resolve(category, &self.scope, value) {
            Resolution::Id(id) => Some(id),
            Resolution::Deferred(marker) => {
                log::debug!("deferring {category} reference `{value}` to name resolution");
                Some(marker)
            }
            Resolution::Unresolved => {
                self.diagnostics.error(
                    "unresolvable reference",
                    format!(
                        "{category} `{value}` has no known id and the category does not support resolve-by-name"
                    ),
                );
                None
            }
        }
    }

    /// The backend id bound to a name, when already known
    pub fn resolved_id(&self, category: &str, name: &str) -> Option<String> {
        self.registry.resolved_id(category, &self.scope, name)
    }
}
