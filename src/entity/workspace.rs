//! Workspace entity
//!
//! The top-level managed tree: a workspace owns unordered role and template
//! lists. Collect passes walk every nested entity; reconciliation runs both
//! lists through the matching engine before serialization.

use modelkit::{Describe, Descriptor, FieldSpec, ListValue, Value, descriptor_of};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::handler::Handler;
use crate::matching::{match_for_modify, match_for_set};
use crate::model::{Model, absorb_str, collapse_list, emit_str};
use crate::wire::{self, WireObject, WireValue};

use super::role::Role;
use super::template::Template;

/// One managed workspace with its nested entities
///
/// Serializable as a whole: the host engine persists the stored tree between
/// operations, ids included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: Value<String>,
    pub name: Value<String>,
    pub roles: ListValue<Role>,
    pub templates: ListValue<Template>,
}

static WORKSPACE_FIELDS: &[FieldSpec] = &[
    FieldSpec::computed("id", "id"),
    FieldSpec::new("name", "name"),
    FieldSpec::new("roles", "roles"),
    FieldSpec::new("templates", "templates"),
];
static WORKSPACE_DESCRIPTOR: Descriptor = Descriptor::new("Workspace", WORKSPACE_FIELDS);

impl Workspace {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Value::Present(name.into()),
            ..Self::empty()
        }
    }
}

impl Describe for Workspace {
    fn descriptor() -> &'static Descriptor {
        &WORKSPACE_DESCRIPTOR
    }

    fn empty() -> Self {
        Self {
            id: Value::Unset,
            name: Value::Unset,
            roles: ListValue::unset(),
            templates: ListValue::unset(),
        }
    }
}

impl Model for Workspace {
    fn values(&self, handler: &mut Handler) -> WireValue {
        let mut object = WireObject::new();
        emit_str(&mut object, "id", &self.id);
        emit_str(&mut object, "name", &self.name);
        if let Some(roles) = collapse_list(handler, &self.roles) {
            object.insert("roles".to_string(), roles);
        }
        if let Some(templates) = collapse_list(handler, &self.templates) {
            object.insert("templates".to_string(), templates);
        }
        WireValue::Object(object)
    }

    fn set_values(&mut self, handler: &mut Handler, payload: &WireValue) -> Result<()> {
        let d = descriptor_of::<Self>();
        absorb_str(&mut self.id, payload, d.expect_field("id"))?;
        absorb_str(&mut self.name, payload, d.expect_field("name"))?;
        if let Some(items) = wire::array_field(payload, "roles")? {
            match_for_set(handler, &mut self.roles, items)?;
        }
        if let Some(items) = wire::array_field(payload, "templates")? {
            match_for_set(handler, &mut self.templates, items)?;
        }
        Ok(())
    }

    fn collect_references(&self, handler: &mut Handler) {
        for role in self.roles.elements() {
            role.collect_references(handler);
        }
        for template in self.templates.elements() {
            template.collect_references(handler);
        }
    }

    fn update_references(&mut self, handler: &mut Handler) {
        self.templates.mutate_each(|_, mut template| {
            template.update_references(handler);
            template
        });
    }

    fn reconcile_with(&mut self, _handler: &mut Handler, prior: &Self) {
        match_for_modify(&prior.roles, &mut self.roles);
        match_for_modify(&prior.templates, &mut self.templates);
    }
}
