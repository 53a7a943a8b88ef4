//! Per-entity operation flows
//!
//! One create/read/update/delete operation runs synchronously on its own
//! logical thread of control, with a fresh handler. The flow stitches the
//! conversion protocol, the reference registry passes, and the matching
//! engine together:
//!
//! 1. collect pass 1 - walk the tree before mutation, registering every
//!    entity with a currently known id
//! 2. `values()` - serialize; collected errors abort before any transport call
//! 3. transport call - a typed failure aborts immediately, no partial apply
//! 4. `set_values()` - apply the server response
//! 5. collect pass 2 - re-walk; created entities now have ids
//! 6. `update_references()` - replace bare names with resolved ids so
//!    persisted state is self-consistent without the ephemeral registry

use crate::error::{Error, Result};
use crate::handler::Handler;
use crate::model::Model;
use crate::transport::Transport;
use crate::wire::WireValue;

/// Create a new entity from the planned model, stitching assigned ids back in
pub fn create<T: Model>(
    transport: &dyn Transport,
    handler: &mut Handler,
    kind: &str,
    model: &mut T,
) -> Result<()> {
    log::debug!("creating {kind} in scope `{}`", handler.scope());

    handler.begin_rebuild();
    model.collect_references(handler);

    let payload = model.values(handler);
    ensure_no_errors(handler)?;

    let (id, response) = transport.create(handler.scope(), kind, &payload)?;
    let response = with_assigned_id(response, &id);
    model.set_values(handler, &response)?;

    handler.begin_rebuild();
    model.collect_references(handler);
    model.update_references(handler);
    ensure_no_errors(handler)
}

/// Refresh the model from the remote entity
pub fn read<T: Model>(
    transport: &dyn Transport,
    handler: &mut Handler,
    kind: &str,
    id: &str,
    model: &mut T,
) -> Result<()> {
    log::debug!("reading {kind} `{id}` in scope `{}`", handler.scope());

    let response = transport.read(handler.scope(), kind, id)?;
    model.set_values(handler, &response)?;

    handler.begin_rebuild();
    model.collect_references(handler);
    ensure_no_errors(handler)
}

/// Converge the remote entity to the planned model.
///
/// When the previously stored state is supplied, the matching engine runs
/// first so planned entries inherit stored identities instead of being
/// destroyed and recreated.
pub fn update<T: Model>(
    transport: &dyn Transport,
    handler: &mut Handler,
    kind: &str,
    id: &str,
    model: &mut T,
    prior: Option<&T>,
) -> Result<()> {
    log::debug!("updating {kind} `{id}` in scope `{}`", handler.scope());

    if let Some(prior) = prior {
        model.reconcile_with(handler, prior);
    }

    handler.begin_rebuild();
    model.collect_references(handler);

    let payload = model.values(handler);
    ensure_no_errors(handler)?;

    let response = transport.update(handler.scope(), kind, id, &payload)?;
    model.set_values(handler, &response)?;

    handler.begin_rebuild();
    model.collect_references(handler);
    model.update_references(handler);
    ensure_no_errors(handler)
}

/// Delete the remote entity
pub fn delete(transport: &dyn Transport, handler: &mut Handler, kind: &str, id: &str) -> Result<()> {
    log::debug!("deleting {kind} `{id}` in scope `{}`", handler.scope());
    transport.delete(handler.scope(), kind, id)
}

/// Some APIs return the assigned id out of band; fold it into the response
/// payload so `set_values` sees one authoritative object
fn with_assigned_id(response: WireValue, id: &str) -> WireValue {
    match response {
        WireValue::Object(mut object) => {
            object
                .entry("id".to_string())
                .or_insert_with(|| WireValue::String(id.to_string()));
            WireValue::Object(object)
        }
        other => other,
    }
}

fn ensure_no_errors(handler: &Handler) -> Result<()> {
    if handler.diagnostics.has_errors() {
        return Err(Error::Validation {
            count: handler.diagnostics.error_count(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{absorb_str, emit_str};
    use crate::registry::ReferenceRegistry;
    use crate::wire::WireObject;
    use modelkit::{Describe, Descriptor, FieldSpec, Value, descriptor_of};
    use serde_json::json;
    use std::cell::RefCell;

    #[derive(Debug, Clone, PartialEq)]
    struct Gadget {
        id: Value<String>,
        name: Value<String>,
    }

    static GADGET_FIELDS: &[FieldSpec] = &[
        FieldSpec::computed("id", "id"),
        FieldSpec::new("name", "name"),
    ];
    static GADGET_DESCRIPTOR: Descriptor = Descriptor::new("Gadget", GADGET_FIELDS);

    impl Describe for Gadget {
        fn descriptor() -> &'static Descriptor {
            &GADGET_DESCRIPTOR
        }

        fn empty() -> Self {
            Self {
                id: Value::Unset,
                name: Value::Unset,
            }
        }
    }

    impl Model for Gadget {
        fn values(&self, _handler: &mut Handler) -> WireValue {
            let mut object = WireObject::new();
            emit_str(&mut object, "name", &self.name);
            WireValue::Object(object)
        }

        fn set_values(&mut self, _handler: &mut Handler, payload: &WireValue) -> Result<()> {
            let d = descriptor_of::<Self>();
            absorb_str(&mut self.id, payload, d.expect_field("id"))?;
            absorb_str(&mut self.name, payload, d.expect_field("name"))?;
            Ok(())
        }
    }

    /// Records calls; create returns the id out of band only
    struct FakeTransport {
        calls: RefCell<Vec<String>>,
        fail: bool,
    }

    impl FakeTransport {
        fn new() -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                fail: true,
            }
        }
    }

    impl Transport for FakeTransport {
        fn create(
            &self,
            _scope: &str,
            kind: &str,
            payload: &WireValue,
        ) -> Result<(String, WireValue)> {
            self.calls.borrow_mut().push(format!("create {kind}"));
            if self.fail {
                return Err(Error::transport("create", "boom"));
            }
            Ok(("g1".to_string(), payload.clone()))
        }

        fn read(&self, _scope: &str, kind: &str, id: &str) -> Result<WireValue> {
            self.calls.borrow_mut().push(format!("read {kind}/{id}"));
            Ok(json!({"id": id, "name": "remote"}))
        }

        fn update(
            &self,
            _scope: &str,
            kind: &str,
            id: &str,
            payload: &WireValue,
        ) -> Result<WireValue> {
            self.calls.borrow_mut().push(format!("update {kind}/{id}"));
            let mut object = payload.as_object().cloned().unwrap_or_default();
            object.insert("id".to_string(), json!(id));
            Ok(WireValue::Object(object))
        }

        fn delete(&self, _scope: &str, kind: &str, id: &str) -> Result<()> {
            self.calls.borrow_mut().push(format!("delete {kind}/{id}"));
            Ok(())
        }
    }

    fn handler() -> Handler {
        Handler::new("p1", ReferenceRegistry::new())
    }

    #[test]
    fn test_create_stitches_assigned_id() {
        let transport = FakeTransport::new();
        let mut handler = handler();
        let mut gadget = Gadget {
            id: Value::Unset,
            name: Value::Present("alpha".into()),
        };

        create(&transport, &mut handler, "gadget", &mut gadget).unwrap();

        assert_eq!(gadget.id, Value::Present("g1".to_string()));
        assert_eq!(gadget.name, Value::Present("alpha".to_string()));
        assert_eq!(transport.calls.borrow().as_slice(), ["create gadget"]);
    }

    #[test]
    fn test_transport_failure_aborts_with_no_partial_apply() {
        let transport = FakeTransport::failing();
        let mut handler = handler();
        let mut gadget = Gadget {
            id: Value::Unset,
            name: Value::Present("alpha".into()),
        };

        let result = create(&transport, &mut handler, "gadget", &mut gadget);

        assert!(matches!(result, Err(Error::Transport { .. })));
        assert!(gadget.id.is_unset());
    }

    #[test]
    fn test_validation_errors_abort_before_transport() {
        let transport = FakeTransport::new();
        // No name-resolution support for "role": the lookup miss below is an error
        let mut handler = Handler::new("p1", ReferenceRegistry::new());

        #[derive(Debug, Clone)]
        struct NeedsRole {
            name: Value<String>,
        }

        static NEEDS_FIELDS: &[FieldSpec] = &[FieldSpec::new("name", "name")];
        static NEEDS_DESCRIPTOR: Descriptor = Descriptor::new("NeedsRole", NEEDS_FIELDS);

        impl Describe for NeedsRole {
            fn descriptor() -> &'static Descriptor {
                &NEEDS_DESCRIPTOR
            }

            fn empty() -> Self {
                Self { name: Value::Unset }
            }
        }

        impl Model for NeedsRole {
            fn values(&self, handler: &mut Handler) -> WireValue {
                let mut object = WireObject::new();
                if let Some(name) = self.name.as_present() {
                    if let Some(resolved) = handler.resolve("role", name) {
                        object.insert("role".to_string(), WireValue::String(resolved));
                    }
                }
                WireValue::Object(object)
            }

            fn set_values(&mut self, _handler: &mut Handler, _payload: &WireValue) -> Result<()> {
                Ok(())
            }
        }

        let mut model = NeedsRole {
            name: Value::Present("Admin".into()),
        };
        let result = create(&transport, &mut handler, "thing", &mut model);

        assert!(matches!(result, Err(Error::Validation { count: 1 })));
        assert!(transport.calls.borrow().is_empty());
    }

    #[test]
    fn test_read_overwrites_computed_and_fills_unset() {
        let transport = FakeTransport::new();
        let mut handler = handler();
        let mut gadget = Gadget::empty();

        read(&transport, &mut handler, "gadget", "g7", &mut gadget).unwrap();

        assert_eq!(gadget.id, Value::Present("g7".to_string()));
        assert_eq!(gadget.name, Value::Present("remote".to_string()));
    }

    #[test]
    fn test_update_and_delete_hit_the_transport() {
        let transport = FakeTransport::new();
        let mut handler = handler();
        let mut gadget = Gadget {
            id: Value::Present("g1".into()),
            name: Value::Present("renamed".into()),
        };

        update(&transport, &mut handler, "gadget", "g1", &mut gadget, None).unwrap();
        delete(&transport, &mut handler, "gadget", "g1").unwrap();

        assert_eq!(
            transport.calls.borrow().as_slice(),
            ["update gadget/g1", "delete gadget/g1"]
        );
    }
}
