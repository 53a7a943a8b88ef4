//! Tri-state containers over model elements
//!
//! Three container kinds: `ObjectValue` (0 or 1 element), `ListValue`
//! (ordered 0..n), `MapValue` (keyed 0..n, deterministic iteration order).
//! Expansion hands out owned clones; in-place mutation is explicit
//! checkout/checkin - the element is moved out, handed to the caller by
//! value, and the returned value is written back. There is no unordered Set
//! container; callers needing set semantics sort before comparing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// A single optional nested element with tri-state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ObjectValue<T> {
    value: Value<T>,
}

impl<T> ObjectValue<T> {
    pub fn unset() -> Self {
        Self {
            value: Value::Unset,
        }
    }

    pub fn pending() -> Self {
        Self {
            value: Value::Pending,
        }
    }

    pub fn from_element(element: T) -> Self {
        Self {
            value: Value::Present(element),
        }
    }

    pub fn is_unset(&self) -> bool {
        self.value.is_unset()
    }

    pub fn is_pending(&self) -> bool {
        self.value.is_pending()
    }

    pub fn is_present(&self) -> bool {
        self.value.is_present()
    }

    /// Borrow the element, if present
    pub fn as_ref(&self) -> Option<&T> {
        self.value.as_present()
    }

    pub fn set(&mut self, element: T) {
        self.value = Value::Present(element);
    }

    pub fn set_unset(&mut self) {
        self.value = Value::Unset;
    }

    pub fn set_pending(&mut self) {
        self.value = Value::Pending;
    }

    /// Checkout/checkin mutation: the element is moved out, handed to the
    /// caller by value, and the returned value is written back. No-op unless
    /// present.
    pub fn mutate(&mut self, f: impl FnOnce(T) -> T) {
        let current = std::mem::replace(&mut self.value, Value::Pending);
        self.value = match current {
            Value::Present(element) => Value::Present(f(element)),
            other => other,
        };
    }
}

impl<T: Clone> ObjectValue<T> {
    /// Clone out the element for traversal, if present
    pub fn get(&self) -> Option<T> {
        self.value.to_present()
    }
}

/// An ordered collection of nested elements with tri-state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ListValue<T> {
    value: Value<Vec<T>>,
}

impl<T> ListValue<T> {
    pub fn unset() -> Self {
        Self {
            value: Value::Unset,
        }
    }

    pub fn pending() -> Self {
        Self {
            value: Value::Pending,
        }
    }

    /// Build from a fully-materialized element vector (copy-on-build:
    /// callers only ever observe a complete list)
    pub fn from_elements(elements: Vec<T>) -> Self {
        Self {
            value: Value::Present(elements),
        }
    }

    pub fn is_unset(&self) -> bool {
        self.value.is_unset()
    }

    pub fn is_pending(&self) -> bool {
        self.value.is_pending()
    }

    pub fn is_present(&self) -> bool {
        self.value.is_present()
    }

    /// Number of elements; zero when not present
    pub fn len(&self) -> usize {
        self.value.as_present().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the elements for traversal; empty unless present
    pub fn elements(&self) -> &[T] {
        self.value.as_present().map_or(&[], Vec::as_slice)
    }

    /// Replace the whole list with a fully-built element vector
    pub fn set(&mut self, elements: Vec<T>) {
        self.value = Value::Present(elements);
    }

    pub fn set_unset(&mut self) {
        self.value = Value::Unset;
    }

    pub fn set_pending(&mut self) {
        self.value = Value::Pending;
    }

    /// Append an element, promoting an unset or pending list to present
    pub fn push(&mut self, element: T) {
        match &mut self.value {
            Value::Present(elements) => elements.push(element),
            _ => self.value = Value::Present(vec![element]),
        }
    }

    /// Checkout/checkin iteration: each element is moved out in order,
    /// handed to the caller by value, and the returned value written back at
    /// each step. The container is fully reassigned at loop exit. No-op
    /// unless present.
    pub fn mutate_each(&mut self, mut f: impl FnMut(usize, T) -> T) {
        let current = std::mem::replace(&mut self.value, Value::Pending);
        self.value = match current {
            Value::Present(elements) => {
                let mut updated = Vec::with_capacity(elements.len());
                for (index, element) in elements.into_iter().enumerate() {
                    updated.push(f(index, element));
                }
                Value::Present(updated)
            }
            other => other,
        };
    }
}

impl<T: Clone> ListValue<T> {
    /// Clone out the elements for traversal; empty unless present
    pub fn to_vec(&self) -> Vec<T> {
        self.value.as_present().cloned().unwrap_or_default()
    }
}

/// A keyed collection of nested elements with tri-state
///
/// Backed by a `BTreeMap` so iteration order is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MapValue<T> {
    value: Value<BTreeMap<String, T>>,
}

impl<T> MapValue<T> {
    pub fn unset() -> Self {
        Self {
            value: Value::Unset,
        }
    }

    pub fn pending() -> Self {
        Self {
            value: Value::Pending,
        }
    }

    /// Build from fully-materialized entries (copy-on-build)
    pub fn from_entries(entries: BTreeMap<String, T>) -> Self {
        Self {
            value: Value::Present(entries),
        }
    }

    pub fn is_unset(&self) -> bool {
        self.value.is_unset()
    }

    pub fn is_pending(&self) -> bool {
        self.value.is_pending()
    }

    pub fn is_present(&self) -> bool {
        self.value.is_present()
    }

    pub fn len(&self) -> usize {
        self.value.as_present().map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow an entry by key
    pub fn get(&self, key: &str) -> Option<&T> {
        self.value.as_present().and_then(|entries| entries.get(key))
    }

    /// Insert an entry, promoting an unset or pending map to present
    pub fn insert(&mut self, key: impl Into<String>, element: T) {
        match &mut self.value {
            Value::Present(entries) => {
                entries.insert(key.into(), element);
            }
            _ => {
                let mut entries = BTreeMap::new();
                entries.insert(key.into(), element);
                self.value = Value::Present(entries);
            }
        }
    }

    pub fn set_unset(&mut self) {
        self.value = Value::Unset;
    }

    pub fn set_pending(&mut self) {
        self.value = Value::Pending;
    }

    /// Checkout/checkin iteration over entries in key order; the returned
    /// value is written back under the same key at each step. No-op unless
    /// present.
    pub fn mutate_each(&mut self, mut f: impl FnMut(&str, T) -> T) {
        let current = std::mem::replace(&mut self.value, Value::Pending);
        self.value = match current {
            Value::Present(entries) => {
                let mut updated = BTreeMap::new();
                for (key, element) in entries {
                    let replacement = f(&key, element);
                    updated.insert(key, replacement);
                }
                Value::Present(updated)
            }
            other => other,
        };
    }
}

impl<T: Clone> MapValue<T> {
    /// Clone out the entries for traversal; empty unless present
    pub fn to_map(&self) -> BTreeMap<String, T> {
        self.value.as_present().cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_states() {
        let mut object: ObjectValue<String> = ObjectValue::unset();
        assert!(object.is_unset());
        assert!(object.get().is_none());

        object.set_pending();
        assert!(object.is_pending());

        object.set("x".to_string());
        assert_eq!(object.get().as_deref(), Some("x"));
    }

    #[test]
    fn test_object_mutate_checkin() {
        let mut object = ObjectValue::from_element("a".to_string());
        object.mutate(|mut element| {
            element.push('b');
            element
        });
        assert_eq!(object.get().as_deref(), Some("ab"));

        // Not present: closure never runs, state is preserved
        let mut unset: ObjectValue<String> = ObjectValue::unset();
        unset.mutate(|_| unreachable!());
        assert!(unset.is_unset());
    }

    #[test]
    fn test_list_roundtrip_via_to_vec() {
        let list = ListValue::from_elements(vec![1, 2, 3]);
        let rebuilt = ListValue::from_elements(list.to_vec());
        assert_eq!(list, rebuilt);
        assert_eq!(rebuilt.len(), 3);
    }

    #[test]
    fn test_list_mutate_each_writes_back_in_order() {
        let mut list = ListValue::from_elements(vec![10, 20, 30]);
        list.mutate_each(|index, element| element + index as i64);
        assert_eq!(list.to_vec(), vec![10, 21, 32]);
    }

    #[test]
    fn test_list_mutate_each_preserves_non_present_state() {
        let mut pending: ListValue<i64> = ListValue::pending();
        pending.mutate_each(|_, _| unreachable!());
        assert!(pending.is_pending());
    }

    #[test]
    fn test_list_push_promotes_to_present() {
        let mut list: ListValue<i64> = ListValue::unset();
        list.push(1);
        assert!(list.is_present());
        assert_eq!(list.to_vec(), vec![1]);
    }

    #[test]
    fn test_map_roundtrip_via_to_map() {
        let mut map: MapValue<i64> = MapValue::unset();
        map.insert("b", 2);
        map.insert("a", 1);
        let rebuilt = MapValue::from_entries(map.to_map());
        assert_eq!(map, rebuilt);
        assert_eq!(rebuilt.get("a"), Some(&1));
    }

    #[test]
    fn test_map_mutate_each_keeps_keys() {
        let mut map: MapValue<i64> = MapValue::unset();
        map.insert("a", 1);
        map.insert("b", 2);
        map.mutate_each(|_, element| element * 10);
        assert_eq!(map.get("a"), Some(&10));
        assert_eq!(map.get("b"), Some(&20));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_map_iteration_is_deterministic() {
        let mut map: MapValue<i64> = MapValue::unset();
        map.insert("z", 1);
        map.insert("a", 2);
        map.insert("m", 3);
        let keys: Vec<String> = map.to_map().into_keys().collect();
        assert_eq!(keys, vec!["a", "m", "z"]);
    }
}
