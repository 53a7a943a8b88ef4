//! Tri-state value primitive
//!
//! Remote-assigned identifiers and computed defaults are unknown until after
//! execution, so every scalar slot distinguishes "not yet known" from "known
//! empty". Callers must never read a `Pending` value as if it were `Present`.

use serde::{Deserialize, Serialize};

/// A scalar slot that is absent, not yet resolved, or materialized.
///
/// - `Unset`: the value is absent; defaults apply
/// - `Pending`: the value is determined only after execution and must not be
///   inspected earlier
/// - `Present(T)`: the value is materialized and exclusively owned by this slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Value<T> {
    #[default]
    Unset,
    Pending,
    Present(T),
}

impl<T> Value<T> {
    /// Check if the slot is absent
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// Check if the slot is awaiting a value from execution
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Check if the slot holds a materialized value
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    /// Borrow the materialized value, if any
    pub fn as_present(&self) -> Option<&T> {
        match self {
            Self::Present(v) => Some(v),
            _ => None,
        }
    }

    /// Take the materialized value, if any, leaving nothing behind
    pub fn into_present(self) -> Option<T> {
        match self {
            Self::Present(v) => Some(v),
            _ => None,
        }
    }

    /// The materialized value, or a fallback for `Unset`/`Pending`
    pub fn present_or(self, default: T) -> T {
        match self {
            Self::Present(v) => v,
            _ => default,
        }
    }

    /// Map the materialized value, preserving `Unset`/`Pending` as-is
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Value<U> {
        match self {
            Self::Present(v) => Value::Present(f(v)),
            Self::Pending => Value::Pending,
            Self::Unset => Value::Unset,
        }
    }
}

impl<T: Clone> Value<T> {
    /// Clone out the materialized value, if any
    pub fn to_present(&self) -> Option<T> {
        self.as_present().cloned()
    }
}

impl<T> From<T> for Value<T> {
    fn from(v: T) -> Self {
        Self::Present(v)
    }
}
