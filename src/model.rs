//! Conversion protocol between models and wire payloads
//!
//! Every model implements `values` (pure serialization of current field
//! state plus registry lookups, no I/O) and `set_values` (update fields from
//! a response payload). User-authored Present fields survive a response;
//! server-computed fields are always overwritten. Container expansion is
//! copy-on-build: nothing is published until every element converted.

use std::fmt;

use modelkit::{Describe, FieldSpec, ListValue, ObjectValue, Value};

use crate::error::Result;
use crate::handler::Handler;
use crate::wire::{self, WireObject, WireValue};

/// A structured record with wire-mapped fields
pub trait Model: Describe + Clone + fmt::Debug {
    /// Serialize current field state into a wire payload.
    ///
    /// Pending and Unset fields are omitted; reference-holding fields go
    /// through the handler's registry. Never performs I/O.
    fn values(&self, handler: &mut Handler) -> WireValue;

    /// Update fields from a response payload.
    ///
    /// Fields already Present from user authorship are preserved unless the
    /// descriptor marks them server-computed.
    fn set_values(&mut self, handler: &mut Handler, payload: &WireValue) -> Result<()>;

    /// Register named referenceable entities introduced by this model.
    ///
    /// Invoked twice per operation: before mutation with currently known
    /// ids, and after the response once created entities have ids.
    fn collect_references(&self, _handler: &mut Handler) {}

    /// Final walk replacing name-holding fields with resolved ids, so
    /// persisted state is self-consistent without the ephemeral registry.
    fn update_references(&mut self, _handler: &mut Handler) {}

    /// Pre-serialization reconciliation against the previously stored state
    /// (identity matching for unordered sub-entity lists).
    fn reconcile_with(&mut self, _handler: &mut Handler, _prior: &Self) {}
}

// ============================================================================
// Scalar field helpers
// ============================================================================

/// Emit a string field: Present values only, Pending/Unset omit the key
pub fn emit_str(object: &mut WireObject, wire_key: &str, value: &Value<String>) {
    if let Some(v) = value.as_present() {
        object.insert(wire_key.to_string(), WireValue::String(v.clone()));
    }
}

/// Emit a boolean field: Present values only
pub fn emit_bool(object: &mut WireObject, wire_key: &str, value: &Value<bool>) {
    if let Some(v) = value.as_present() {
        object.insert(wire_key.to_string(), WireValue::Bool(*v));
    }
}

/// Emit an integer field: Present values only
pub fn emit_int(object: &mut WireObject, wire_key: &str, value: &Value<i64>) {
    if let Some(v) = value.as_present() {
        object.insert(wire_key.to_string(), WireValue::Number((*v).into()));
    }
}

/// Absorb a string field from a response payload.
///
/// Server-computed fields are always overwritten; user-authored fields are
/// preserved when already Present.
pub fn absorb_str(field: &mut Value<String>, payload: &WireValue, spec: &FieldSpec) -> Result<()> {
    let incoming = wire::str_field(payload, spec.wire_key)?;
    absorb(field, incoming, spec);
    Ok(())
}

/// Absorb a boolean field from a response payload
pub fn absorb_bool(field: &mut Value<bool>, payload: &WireValue, spec: &FieldSpec) -> Result<()> {
    let incoming = wire::bool_field(payload, spec.wire_key)?;
    absorb(field, incoming, spec);
    Ok(())
}

/// Absorb an integer field from a response payload
pub fn absorb_int(field: &mut Value<i64>, payload: &WireValue, spec: &FieldSpec) -> Result<()> {
    let incoming = wire::int_field(payload, spec.wire_key)?;
    absorb(field, incoming, spec);
    Ok(())
}

fn absorb<T>(field: &mut Value<T>, incoming: Option<T>, spec: &FieldSpec) {
    if !spec.computed && field.is_present() {
        return;
    }
    *field = incoming.map_or(Value::Unset, Value::Present);
}

// ============================================================================
// Container expansion (copy-on-build)
// ============================================================================

/// Expand a wire array into a list container.
///
/// Every element is converted before the container becomes Present; an
/// element error aborts the expansion with nothing published.
pub fn expand_list<T: Model>(handler: &mut Handler, items: &[WireValue]) -> Result<ListValue<T>> {
    let mut elements = Vec::with_capacity(items.len());
    for item in items {
        let mut element = T::empty();
        element.set_values(handler, item)?;
        elements.push(element);
    }
    Ok(ListValue::from_elements(elements))
}

/// Expand a single wire object into an object container
pub fn expand_object<T: Model>(handler: &mut Handler, payload: &WireValue) -> Result<ObjectValue<T>> {
    let mut element = T::empty();
    element.set_values(handler, payload)?;
    Ok(ObjectValue::from_element(element))
}

/// Serialize a list container into a wire array; non-Present lists yield
/// `None` so the caller can omit the key
pub fn collapse_list<T: Model>(handler: &mut Handler, list: &ListValue<T>) -> Option<WireValue> {
    if !list.is_present() {
        return None;
    }
    let items: Vec<WireValue> = list
        .elements()
        .iter()
        .map(|element| element.values(handler))
        .collect();
    Some(WireValue::Array(items))
}
