//! Role entity
//!
//! Roles are referenceable by name: other entities hold a role name as a
//! foreign key and the registry swaps in the server-assigned id.

use modelkit::{Describe, Descriptor, FieldSpec, Value, descriptor_of};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::handler::Handler;
use crate::matching::MatchKey;
use crate::model::{Model, absorb_str, emit_str};
use crate::wire::{WireObject, WireValue};

/// Registry category for role references
pub const ROLE_CATEGORY: &str = "role";

/// A named permission role managed remotely
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    /// Server-assigned identifier
    pub id: Value<String>,
    /// User-chosen, unique within the scope
    pub name: Value<String>,
    pub description: Value<String>,
}

static ROLE_FIELDS: &[FieldSpec] = &[
    FieldSpec::computed("id", "id"),
    FieldSpec::new("name", "name"),
    FieldSpec::new("description", "description"),
];
static ROLE_DESCRIPTOR: Descriptor = Descriptor::new("Role", ROLE_FIELDS);

impl Role {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: Value::Unset,
            name: Value::Present(name.into()),
            description: Value::Unset,
        }
    }
}

impl Describe for Role {
    fn descriptor() -> &'static Descriptor {
        &ROLE_DESCRIPTOR
    }

    fn empty() -> Self {
        Self {
            id: Value::Unset,
            name: Value::Unset,
            description: Value::Unset,
        }
    }
}

impl Model for Role {
    fn values(&self, _handler: &mut Handler) -> WireValue {
        let mut object = WireObject::new();
        // The id is server-owned but sent back when known so the remote can
        // address the existing entity instead of creating a new one
        emit_str(&mut object, "id", &self.id);
        emit_str(&mut object, "name", &self.name);
        emit_str(&mut object, "description", &self.description);
        WireValue::Object(object)
    }

    fn set_values(&mut self, _handler: &mut Handler, payload: &WireValue) -> Result<()> {
        let d = descriptor_of::<Self>();
        absorb_str(&mut self.id, payload, d.expect_field("id"))?;
        absorb_str(&mut self.name, payload, d.expect_field("name"))?;
        absorb_str(&mut self.description, payload, d.expect_field("description"))?;
        Ok(())
    }

    fn collect_references(&self, handler: &mut Handler) {
        if let Some(name) = self.name.to_present() {
            handler.register(ROLE_CATEGORY, &name, self.id.clone());
        }
    }
}

impl MatchKey for Role {
    fn match_name(&self) -> Option<&str> {
        self.name.as_present().map(String::as_str)
    }

    fn assigned_id(&self) -> Option<&str> {
        self.id.as_present().map(String::as_str)
    }

    fn assign_id(&mut self, id: String) {
        self.id = Value::Present(id);
    }
}
