//! End-to-end provider flows against a simulated remote API
//!
//! The fake server assigns opaque ids the way a real management API would
//! and understands the deferred resolve-by-name markers the registry emits.

use std::cell::RefCell;
use std::collections::HashMap;

use anyhow::Result;
use modelkit::{ListValue, Value};
use serde_json::json;
use steward::entity::{ROLE_CATEGORY, Parameter, Role, Template, Workspace};
use steward::registry::parse_deferred_marker;
use steward::{Error, Handler, ReferenceRegistry, Transport, WireValue, operation};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Simulated management API: assigns sequential ids per entity kind and
/// resolves `@name:` markers against the names in the same request
struct FakeServer {
    counters: RefCell<HashMap<String, u64>>,
    fail_create: bool,
}

impl FakeServer {
    fn new() -> Self {
        Self {
            counters: RefCell::new(HashMap::new()),
            fail_create: false,
        }
    }

    fn failing() -> Self {
        Self {
            counters: RefCell::new(HashMap::new()),
            fail_create: true,
        }
    }

    fn next_id(&self, prefix: &str) -> String {
        let mut counters = self.counters.borrow_mut();
        let counter = counters.entry(prefix.to_string()).or_insert(0);
        *counter += 1;
        format!("{prefix}{counter}")
    }

    /// Assign ids to every nested entity missing one, and resolve deferred
    /// role markers against the role names assigned in this same request
    fn materialize(&self, payload: &WireValue) -> WireValue {
        let mut response = payload.clone();
        let mut role_ids: Vec<(String, String)> = Vec::new();

        if let Some(roles) = response.get_mut("roles").and_then(WireValue::as_array_mut) {
            for role in roles {
                let existing = role.get("id").and_then(WireValue::as_str).map(str::to_string);
                let id = existing.unwrap_or_else(|| {
                    let id = self.next_id("r");
                    role["id"] = WireValue::String(id.clone());
                    id
                });
                if let Some(name) = role.get("name").and_then(WireValue::as_str) {
                    role_ids.push((name.to_string(), id));
                }
            }
        }
        if let Some(templates) = response
            .get_mut("templates")
            .and_then(WireValue::as_array_mut)
        {
            for template in templates {
                if template.get("id").is_none() {
                    template["id"] = json!(self.next_id("t"));
                }
                if let Some(marker) = template.get("role").and_then(WireValue::as_str) {
                    if let Some((category, name)) = parse_deferred_marker(marker) {
                        assert_eq!(category, "role");
                        let resolved = role_ids
                            .iter()
                            .find(|(n, _)| n == name)
                            .map(|(_, id)| id.clone());
                        if let Some(id) = resolved {
                            template["role"] = json!(id);
                        }
                    }
                }
                if let Some(parameters) = template
                    .get_mut("parameters")
                    .and_then(WireValue::as_array_mut)
                {
                    for parameter in parameters {
                        if parameter.get("id").is_none() {
                            parameter["id"] = json!(self.next_id("p"));
                        }
                    }
                }
            }
        }
        response
    }
}

impl Transport for FakeServer {
    fn create(
        &self,
        _scope: &str,
        _kind: &str,
        payload: &WireValue,
    ) -> steward::Result<(String, WireValue)> {
        if self.fail_create {
            return Err(Error::transport("create", "simulated outage"));
        }
        Ok((self.next_id("w"), self.materialize(payload)))
    }

    fn read(&self, _scope: &str, _kind: &str, id: &str) -> steward::Result<WireValue> {
        Ok(json!({"id": id}))
    }

    fn update(
        &self,
        _scope: &str,
        _kind: &str,
        id: &str,
        payload: &WireValue,
    ) -> steward::Result<WireValue> {
        let mut response = self.materialize(payload);
        response["id"] = json!(id);
        Ok(response)
    }

    fn delete(&self, _scope: &str, _kind: &str, _id: &str) -> steward::Result<()> {
        Ok(())
    }
}

fn handler() -> Handler {
    Handler::new(
        "my-project",
        ReferenceRegistry::with_name_resolution(&[ROLE_CATEGORY]),
    )
}

fn planned_workspace() -> Workspace {
    let mut workspace = Workspace::named("main");
    workspace.roles = ListValue::from_elements(vec![Role::named("Admin"), Role::named("Viewer")]);
    let mut template = Template::named("deploy");
    template.role_name = Value::Present("Admin".into());
    template.parameters = ListValue::from_elements(vec![Parameter::new("region", "us")]);
    workspace.templates = ListValue::from_elements(vec![template]);
    workspace
}

#[test]
fn create_resolves_role_reference_to_assigned_id() -> Result<()> {
    init_logging();
    let server = FakeServer::new();
    let mut handler = handler();
    let mut workspace = planned_workspace();

    operation::create(&server, &mut handler, "workspace", &mut workspace)?;

    // Server-assigned ids stitched back into the tree
    assert_eq!(workspace.id, Value::Present("w1".to_string()));
    let roles = workspace.roles.to_vec();
    assert_eq!(roles[0].id, Value::Present("r1".to_string()));
    assert_eq!(roles[1].id, Value::Present("r2".to_string()));

    // The template held the literal name "Admin"; after the second collect
    // pass and update_references it holds the resolved id
    let template = &workspace.templates.to_vec()[0];
    assert_eq!(template.role_name, Value::Present("r1".to_string()));
    assert_eq!(template.parameters.to_vec()[0].id, Value::Present("p1".to_string()));

    assert!(handler.diagnostics.is_empty());
    Ok(())
}

#[test]
fn update_keeps_identities_stable_across_reorder() -> Result<()> {
    init_logging();
    let server = FakeServer::new();
    let mut handler = handler();

    let mut stored = planned_workspace();
    operation::create(&server, &mut handler, "workspace", &mut stored)?;

    // Replan: same entities, roles listed in the opposite order
    let mut planned = Workspace::named("main");
    planned.roles = ListValue::from_elements(vec![Role::named("Viewer"), Role::named("Admin")]);
    let mut template = Template::named("deploy");
    template.role_name = Value::Present("Admin".into());
    template.parameters = ListValue::from_elements(vec![Parameter::new("region", "eu")]);
    planned.templates = ListValue::from_elements(vec![template]);

    let mut handler = self::handler();
    operation::update(
        &server,
        &mut handler,
        "workspace",
        "w1",
        &mut planned,
        Some(&stored),
    )?;

    // Matching carried the stored ids despite the reorder
    let roles = planned.roles.to_vec();
    assert_eq!(roles[0].name, Value::Present("Viewer".to_string()));
    assert_eq!(roles[0].id, Value::Present("r2".to_string()));
    assert_eq!(roles[1].id, Value::Present("r1".to_string()));

    // The nested parameter kept its id through the paired template
    let template = &planned.templates.to_vec()[0];
    assert_eq!(template.parameters.to_vec()[0].id, Value::Present("p1".to_string()));
    assert_eq!(template.parameters.to_vec()[0].value, Value::Present("eu".to_string()));
    Ok(())
}

#[test]
fn update_tolerates_pure_rename_via_positional_fallback() -> Result<()> {
    init_logging();
    let server = FakeServer::new();
    let mut handler = handler();

    let mut stored = Workspace::named("main");
    stored.roles = ListValue::from_elements(vec![Role::named("Admin")]);
    operation::create(&server, &mut handler, "workspace", &mut stored)?;

    let mut planned = Workspace::named("main");
    planned.roles = ListValue::from_elements(vec![Role::named("Administrator")]);

    let mut handler = self::handler();
    operation::update(
        &server,
        &mut handler,
        "workspace",
        "w1",
        &mut planned,
        Some(&stored),
    )?;

    // The renamed role inherited the stored id instead of being recreated
    assert_eq!(planned.roles.to_vec()[0].id, Value::Present("r1".to_string()));
    Ok(())
}

#[test]
fn transport_outage_aborts_with_no_partial_apply() {
    init_logging();
    let server = FakeServer::failing();
    let mut handler = handler();
    let mut workspace = planned_workspace();

    let result = operation::create(&server, &mut handler, "workspace", &mut workspace);

    assert!(matches!(result, Err(Error::Transport { .. })));
    assert!(workspace.id.is_unset());
    assert!(workspace.roles.to_vec().iter().all(|r| r.id.is_unset()));
}

#[test]
fn duplicate_names_block_before_any_transport_call() {
    init_logging();
    let server = FakeServer::new();
    let mut handler = handler();

    let mut workspace = Workspace::named("main");
    workspace.roles = ListValue::from_elements(vec![Role::named("Admin"), Role::named("Admin")]);

    let result = operation::create(&server, &mut handler, "workspace", &mut workspace);

    assert!(matches!(result, Err(Error::Validation { count: 1 })));
    assert!(server.counters.borrow().is_empty());
}
