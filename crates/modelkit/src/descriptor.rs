//! Field descriptors and the per-type descriptor cache
//!
//! Every model type declares an explicit static table mapping its fields to
//! wire keys. The table is validated exactly once per type and memoized by
//! `TypeId`; an invalid table (missing or duplicate wire key) is a
//! programming error and aborts the process on first use, not per-request.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

/// One wire-mapped field of a model type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Struct field name, for error reporting
    pub name: &'static str,
    /// Key the field maps to in the wire payload
    pub wire_key: &'static str,
    /// Whether the field is owned by the server (identifiers, timestamps);
    /// computed fields are always overwritten from responses
    pub computed: bool,
}

impl FieldSpec {
    /// A user-authored field
    pub const fn new(name: &'static str, wire_key: &'static str) -> Self {
        Self {
            name,
            wire_key,
            computed: false,
        }
    }

    /// A server-computed field
    pub const fn computed(name: &'static str, wire_key: &'static str) -> Self {
        Self {
            name,
            wire_key,
            computed: true,
        }
    }
}

/// Ordered field table for one model type
#[derive(Debug)]
pub struct Descriptor {
    /// Model type name, for error reporting
    pub type_name: &'static str,
    /// Fields in declaration order
    pub fields: &'static [FieldSpec],
}

impl Descriptor {
    pub const fn new(type_name: &'static str, fields: &'static [FieldSpec]) -> Self {
        Self { type_name, fields }
    }

    /// Look up a field by struct field name
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Look up a field by struct field name, panicking on descriptor drift
    ///
    /// A model asking for a field its own table does not declare is a
    /// programming error (descriptor/model drift).
    pub fn expect_field(&self, name: &str) -> &FieldSpec {
        self.field(name).unwrap_or_else(|| {
            panic!(
                "descriptor drift: model `{}` has no field `{}` in its descriptor table",
                self.type_name, name
            )
        })
    }

    /// Whether a wire key belongs to a server-computed field
    pub fn is_computed(&self, wire_key: &str) -> bool {
        self.fields
            .iter()
            .any(|f| f.wire_key == wire_key && f.computed)
    }

    /// Validate the table; panics on a malformed entry.
    ///
    /// Called once per type by the cache. Failure here is a static
    /// programming error surfaced at first use of the type.
    fn validate(&self) {
        for (i, field) in self.fields.iter().enumerate() {
            assert!(
                !field.name.is_empty(),
                "descriptor for `{}` has an unnamed field at position {}",
                self.type_name,
                i
            );
            assert!(
                !field.wire_key.is_empty(),
                "field `{}` on `{}` is missing its wire key",
                field.name,
                self.type_name
            );
            for other in &self.fields[i + 1..] {
                assert!(
                    other.wire_key != field.wire_key,
                    "fields `{}` and `{}` on `{}` share wire key `{}`",
                    field.name,
                    other.name,
                    self.type_name,
                    field.wire_key
                );
            }
        }
    }
}

/// A model type with a static field table and a null prototype
pub trait Describe: Sized + 'static {
    /// The static field table for this type
    fn descriptor() -> &'static Descriptor;

    /// The null prototype: an instance with every field at its Unset sentinel
    fn empty() -> Self;
}

static CACHE: OnceLock<Mutex<HashMap<TypeId, &'static Descriptor>>> = OnceLock::new();

/// Fetch the validated descriptor for `T`, memoized per type.
///
/// The first call for a given type validates its field table; a malformed
/// table panics immediately with the type and field named.
pub fn descriptor_of<T: Describe>() -> &'static Descriptor {
    let cache = CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    let mut guard = match cache.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    guard.entry(TypeId::of::<T>()).or_insert_with(|| {
        let descriptor = T::descriptor();
        descriptor.validate();
        log::debug!(
            "cached descriptor for `{}` ({} fields)",
            descriptor.type_name,
            descriptor.fields.len()
        );
        descriptor
    })
}
