//! # Modelkit
//!
//! The typed attribute container runtime.
//!
//! This crate provides the generic primitives a declarative provider needs to
//! model remote entities whose values may not exist yet: a tri-state value
//! wrapper, typed containers over model elements, compile-time field
//! descriptors with a per-type cache, and a diagnostics accumulator.
//!
//! ## Core Concepts
//!
//! - **Value**: a scalar slot that is `Unset`, `Pending`, or `Present(T)`
//! - **ObjectValue / ListValue / MapValue**: tri-state containers over model
//!   elements (0..1, ordered 0..n, keyed 0..n)
//! - **Describe / Descriptor**: an explicit static table of wire-mapped
//!   fields per model type, validated and memoized on first use
//! - **Diagnostics**: an error/warning accumulator that collects instead of
//!   failing fast, so every problem in a tree surfaces together
//!
//! ## Example
//!
//! ```
//! use modelkit::{Describe, Descriptor, FieldSpec, Value, descriptor_of};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Role {
//!     id: Value<String>,
//!     name: Value<String>,
//! }
//!
//! static ROLE_FIELDS: &[FieldSpec] = &[
//!     FieldSpec::computed("id", "id"),
//!     FieldSpec::new("name", "name"),
//! ];
//! static ROLE_DESCRIPTOR: Descriptor = Descriptor::new("Role", ROLE_FIELDS);
//!
//! impl Describe for Role {
//!     fn descriptor() -> &'static Descriptor {
//!         &ROLE_DESCRIPTOR
//!     }
//!
//!     fn empty() -> Self {
//!         Self { id: Value::Unset, name: Value::Unset }
//!     }
//! }
//!
//! let descriptor = descriptor_of::<Role>();
//! assert!(descriptor.field("id").is_some_and(|f| f.computed));
//!
//! let role = Role { id: Value::Pending, name: Value::Present("Admin".into()) };
//! assert!(role.id.is_pending());
//! assert_eq!(role.name.as_present().map(String::as_str), Some("Admin"));
//! ```

pub mod container;
pub mod descriptor;
pub mod diagnostics;
pub mod value;

// Re-export main types at crate root
pub use container::{ListValue, MapValue, ObjectValue};
pub use descriptor::{Describe, Descriptor, FieldSpec, descriptor_of};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use value::Value;
