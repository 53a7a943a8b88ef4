//! Wire payload helpers
//!
//! The wire format exchanged with the remote API is a nested structure of
//! string keys to string/number/boolean/null/object/array - exactly what
//! `serde_json::Value` models. These helpers pull typed fields out of a
//! response payload, turning shape mismatches into typed errors.

use serde_json::Map;

use crate::error::{Error, Result};

/// The nested, dynamically-typed structure exchanged with the remote API
pub type WireValue = serde_json::Value;

/// A wire object under construction
pub type WireObject = Map<String, WireValue>;

/// Extract a string field; `Ok(None)` when absent or null
pub fn str_field(payload: &WireValue, key: &str) -> Result<Option<String>> {
    match payload.get(key) {
        None | Some(WireValue::Null) => Ok(None),
        Some(WireValue::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(Error::payload(key, "string")),
    }
}

/// Extract a boolean field; `Ok(None)` when absent or null
pub fn bool_field(payload: &WireValue, key: &str) -> Result<Option<bool>> {
    match payload.get(key) {
        None | Some(WireValue::Null) => Ok(None),
        Some(WireValue::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(Error::payload(key, "boolean")),
    }
}

/// Extract an integer field; `Ok(None)` when absent or null
pub fn int_field(payload: &WireValue, key: &str) -> Result<Option<i64>> {
    match payload.get(key) {
        None | Some(WireValue::Null) => Ok(None),
        Some(WireValue::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| Error::payload(key, "integer")),
        Some(_) => Err(Error::payload(key, "integer")),
    }
}

/// Extract an array field; `Ok(None)` when absent or null
pub fn array_field<'a>(payload: &'a WireValue, key: &str) -> Result<Option<&'a Vec<WireValue>>> {
    match payload.get(key) {
        None | Some(WireValue::Null) => Ok(None),
        Some(WireValue::Array(items)) => Ok(Some(items)),
        Some(_) => Err(Error::payload(key, "array")),
    }
}

/// Extract an object field; `Ok(None)` when absent or null
pub fn object_field<'a>(payload: &'a WireValue, key: &str) -> Result<Option<&'a WireObject>> {
    match payload.get(key) {
        None | Some(WireValue::Null) => Ok(None),
        Some(WireValue::Object(entries)) => Ok(Some(entries)),
        Some(_) => Err(Error::payload(key, "object")),
    }
}
