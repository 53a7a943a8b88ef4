//! # Steward
//!
//! The data-modeling core of a declarative configuration provider. A
//! user-authored nested configuration tree is translated into calls against
//! a remote management API, and the responses are reconciled back into
//! persisted state - including the opaque identifiers the remote system
//! assigns and the user's configuration never controls.
//!
//! ## Core Concepts
//!
//! - **Model**: a structured record with wire-mapped fields implementing the
//!   `values`/`set_values` conversion protocol (see [`model`])
//! - **Handler**: per-operation context bundling the scope, a diagnostics
//!   sink, and the reference registry (see [`handler`])
//! - **ReferenceRegistry**: name -> backend-identifier bindings, rebuilt by
//!   walking the tree before and after resolution (see [`registry`])
//! - **Matching engine**: heuristics keeping unordered, keyless list entries
//!   stable across replans (see [`matching`])
//! - **Transport**: the create/read/update/delete contract the remote API
//!   exposes; consumed here, implemented elsewhere (see [`transport`])
//!
//! ## Flow
//!
//! Load the config tree, walk it with `values()` to produce a wire payload,
//! hand the payload to the transport, walk the response back with
//! `set_values()`, and finish with the second collect pass and
//! `update_references()` so persisted state holds real ids instead of bare
//! names. Each operation is synchronous and single-threaded; the host engine
//! runs many operations concurrently across independent entities.
//!
//! ## Example
//!
//! ```
//! use modelkit::Value;
//! use steward::entity::{ROLE_CATEGORY, Workspace};
//! use steward::{Handler, ReferenceRegistry};
//!
//! let registry = ReferenceRegistry::with_name_resolution(&[ROLE_CATEGORY]);
//! let mut handler = Handler::new("my-project", registry);
//!
//! let workspace = Workspace::named("main");
//! assert_eq!(workspace.name, Value::Present("main".to_string()));
//! assert!(!handler.diagnostics.has_errors());
//! ```

pub mod entity;
pub mod error;
pub mod handler;
pub mod matching;
pub mod model;
pub mod operation;
pub mod registry;
pub mod transport;
pub mod wire;

// Re-export main types at crate root
pub use error::{Error, Result};
pub use handler::Handler;
pub use matching::{MatchKey, match_for_modify, match_for_set};
pub use model::Model;
pub use registry::{Reference, ReferenceRegistry, Resolution};
pub use transport::{ClientPool, Transport};
pub use wire::{WireObject, WireValue};
