//! Template entity and its parameters
//!
//! A template holds a role reference by name (the server knows the role only
//! by id) and an unordered parameter list whose ids the server assigns, so
//! both the registry and the matching engine are involved on every pass.

use modelkit::{Describe, Descriptor, FieldSpec, ListValue, ObjectValue, Value, descriptor_of};
use serde::{Deserialize, Serialize};

use crate::entity::role::ROLE_CATEGORY;
use crate::error::Result;
use crate::handler::Handler;
use crate::matching::{MatchKey, match_for_modify, match_for_set};
use crate::model::{Model, absorb_int, absorb_str, collapse_list, emit_int, emit_str, expand_object};
use crate::wire::{self, WireObject, WireValue};

/// Registry category for template references
pub const TEMPLATE_CATEGORY: &str = "template";

/// A keyed setting inside a template; the server assigns the id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub id: Value<String>,
    pub name: Value<String>,
    pub value: Value<String>,
}

static PARAMETER_FIELDS: &[FieldSpec] = &[
    FieldSpec::computed("id", "id"),
    FieldSpec::new("name", "name"),
    FieldSpec::new("value", "value"),
];
static PARAMETER_DESCRIPTOR: Descriptor = Descriptor::new("Parameter", PARAMETER_FIELDS);

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: Value::Unset,
            name: Value::Present(name.into()),
            value: Value::Present(value.into()),
        }
    }
}

impl Describe for Parameter {
    fn descriptor() -> &'static Descriptor {
        &PARAMETER_DESCRIPTOR
    }

    fn empty() -> Self {
        Self {
            id: Value::Unset,
            name: Value::Unset,
            value: Value::Unset,
        }
    }
}

impl Model for Parameter {
    fn values(&self, _handler: &mut Handler) -> WireValue {
        let mut object = WireObject::new();
        emit_str(&mut object, "id", &self.id);
        emit_str(&mut object, "name", &self.name);
        emit_str(&mut object, "value", &self.value);
        WireValue::Object(object)
    }

    fn set_values(&mut self, _handler: &mut Handler, payload: &WireValue) -> Result<()> {
        let d = descriptor_of::<Self>();
        absorb_str(&mut self.id, payload, d.expect_field("id"))?;
        absorb_str(&mut self.name, payload, d.expect_field("name"))?;
        absorb_str(&mut self.value, payload, d.expect_field("value"))?;
        Ok(())
    }
}

impl MatchKey for Parameter {
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

/// Resource ceilings attached to a template; all fields user-authored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quota {
    pub cpu: Value<i64>,
    pub memory: Value<i64>,
}

static QUOTA_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("cpu", "cpu"),
    FieldSpec::new("memory", "memory"),
];
static QUOTA_DESCRIPTOR: Descriptor = Descriptor::new("Quota", QUOTA_FIELDS);

impl Quota {
    pub fn new(cpu: i64, memory: i64) -> Self {
        Self {
            cpu: Value::Present(cpu),
            memory: Value::Present(memory),
        }
    }
}

impl Describe for Quota {
    fn descriptor() -> &'static Descriptor {
        &QUOTA_DESCRIPTOR
    }

    fn empty() -> Self {
        Self {
            cpu: Value::Unset,
            memory: Value::Unset,
        }
    }
}

impl Model for Quota {
    fn values(&self, _handler: &mut Handler) -> WireValue {
        let mut object = WireObject::new();
        emit_int(&mut object, "cpu", &self.cpu);
        emit_int(&mut object, "memory", &self.memory);
        WireValue::Object(object)
    }

    fn set_values(&mut self, _handler: &mut Handler, payload: &WireValue) -> Result<()> {
        let d = descriptor_of::<Self>();
        absorb_int(&mut self.cpu, payload, d.expect_field("cpu"))?;
        absorb_int(&mut self.memory, payload, d.expect_field("memory"))?;
        Ok(())
    }
}

/// A named template referencing a role and carrying parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: Value<String>,
    pub name: Value<String>,
    /// Role reference: holds the user-chosen role name until
    /// `update_references` rewrites it to the resolved id
    pub role_name: Value<String>,
    pub quota: ObjectValue<Quota>,
    pub parameters: ListValue<Parameter>,
}

static TEMPLATE_FIELDS: &[FieldSpec] = &[
    FieldSpec::computed("id", "id"),
    FieldSpec::new("name", "name"),
    FieldSpec::new("role_name", "role"),
    FieldSpec::new("quota", "quota"),
    FieldSpec::new("parameters", "parameters"),
];
static TEMPLATE_DESCRIPTOR: Descriptor = Descriptor::new("Template", TEMPLATE_FIELDS);

impl Template {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Value::Present(name.into()),
            ..Self::empty()
        }
    }
}

impl Describe for Template {
    fn descriptor() -> &'static Descriptor {
        &TEMPLATE_DESCRIPTOR
    }

    fn empty() -> Self {
        Self {
            id: Value::Unset,
            name: Value::Unset,
            role_name: Value::Unset,
            quota: ObjectValue::unset(),
            parameters: ListValue::unset(),
        }
    }
}

impl Model for Template {
    fn values(&self, handler: &mut Handler) -> WireValue {
        let mut object = WireObject::new();
        emit_str(&mut object, "id", &self.id);
        emit_str(&mut object, "name", &self.name);
        if let Some(role) = self.role_name.as_present() {
            if let Some(resolved) = handler.resolve(ROLE_CATEGORY, role) {
                object.insert("role".to_string(), WireValue::String(resolved));
            }
        }
        if let Some(quota) = self.quota.as_ref() {
            object.insert("quota".to_string(), quota.values(handler));
        }
        if let Some(parameters) = collapse_list(handler, &self.parameters) {
            object.insert("parameters".to_string(), parameters);
        }
        WireValue::Object(object)
    }

    fn set_values(&mut self, handler: &mut Handler, payload: &WireValue) -> Result<()> {
        let d = descriptor_of::<Self>();
        absorb_str(&mut self.id, payload, d.expect_field("id"))?;
        absorb_str(&mut self.name, payload, d.expect_field("name"))?;
        absorb_str(&mut self.role_name, payload, d.expect_field("role_name"))?;
        if let Some(entries) = wire::object_field(payload, "quota")? {
            let quota_payload = WireValue::Object(entries.clone());
            // A present quota absorbs element-wise so user-authored ceilings
            // survive; an absent one expands fresh (copy-on-build)
            match self.quota.get() {
                Some(mut quota) => {
                    quota.set_values(handler, &quota_payload)?;
                    self.quota.set(quota);
                }
                None => self.quota = expand_object(handler, &quota_payload)?,
            }
        }
        if let Some(items) = wire::array_field(payload, "parameters")? {
            match_for_set(handler, &mut self.parameters, items)?;
        }
        Ok(())
    }

    fn collect_references(&self, handler: &mut Handler) {
        if let Some(name) = self.name.to_present() {
            handler.register(TEMPLATE_CATEGORY, &name, self.id.clone());
        }
    }

    fn update_references(&mut self, handler: &mut Handler) {
        if let Some(role) = self.role_name.to_present() {
            if let Some(id) = handler.resolved_id(ROLE_CATEGORY, &role) {
                log::debug!("rewriting role reference `{role}` to id `{id}`");
                self.role_name = Value::Present(id);
            }
        }
    }

    fn reconcile_with(&mut self, _handler: &mut Handler, prior: &Self) {
        match_for_modify(&prior.parameters, &mut self.parameters);
    }
}

impl MatchKey for Template {
    fn match_name(&self) -> Option<&str> {
        self.name.as_present().map(String::as_str)
    }

    fn assigned_id(&self) -> Option<&str> {
        self.id.as_present().map(String::as_str)
    }

    fn assign_id(&mut self, id: String) {
        self.id = Value::Present(id);
    }

    fn adopt(&mut self, prior: &Self) {
        if self.assigned_id().is_none() {
            if let Some(id) = prior.assigned_id() {
                self.assign_id(id.to_string());
            }
        }
        // Nested sub-entities inherit identity from the paired template
        match_for_modify(&prior.parameters, &mut self.parameters);
    }
}
