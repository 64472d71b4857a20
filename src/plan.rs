//! Planning: diffing prior state against proposed configuration.
//!
//! Planning is driven entirely by the resource [`Schema`]: configurable
//! attributes are compared, computed attributes are carried over or marked
//! unknown (null), and a change to any `force_new` attribute turns the plan
//! into a replacement.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schema::Schema;

/// A change to a single attribute during a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// The path to the attribute that changed.
    pub path: String,
    /// The value before the change (None if creating).
    pub before: Option<Value>,
    /// The value after the change (None if deleting).
    pub after: Option<Value>,
}

impl AttributeChange {
    /// Create a new attribute change.
    pub fn new(path: impl Into<String>, before: Option<Value>, after: Option<Value>) -> Self {
        Self {
            path: path.into(),
            before,
            after,
        }
    }

    /// Create a change for a new attribute.
    pub fn added(path: impl Into<String>, value: Value) -> Self {
        Self::new(path, None, Some(value))
    }

    /// Create a change for a removed attribute.
    pub fn removed(path: impl Into<String>, value: Value) -> Self {
        Self::new(path, Some(value), None)
    }

    /// Create a change for a modified attribute.
    pub fn modified(path: impl Into<String>, before: Value, after: Value) -> Self {
        Self::new(path, Some(before), Some(after))
    }
}

impl From<crate::generated::AttributeChange> for AttributeChange {
    fn from(proto: crate::generated::AttributeChange) -> Self {
        let decode = |bytes: Vec<u8>| {
            if bytes.is_empty() {
                None
            } else {
                serde_json::from_slice(&bytes).ok()
            }
        };
        Self {
            path: proto.path,
            before: decode(proto.before),
            after: decode(proto.after),
        }
    }
}

impl From<AttributeChange> for crate::generated::AttributeChange {
    fn from(change: AttributeChange) -> Self {
        let encode =
            |value: Option<Value>| value.map(|v| v.to_string().into_bytes()).unwrap_or_default();
        Self {
            path: change.path,
            before: encode(change.before),
            after: encode(change.after),
        }
    }
}

/// The result of a plan operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// The planned state after the operation.
    pub planned_state: Value,
    /// The list of attribute changes.
    pub changes: Vec<AttributeChange>,
    /// Whether the resource requires replacement.
    pub requires_replace: bool,
}

impl PlanResult {
    /// Create a plan result with no changes.
    pub fn no_change(state: Value) -> Self {
        Self {
            planned_state: state,
            changes: Vec::new(),
            requires_replace: false,
        }
    }

    /// Create a plan result with changes.
    pub fn with_changes(
        planned_state: Value,
        changes: Vec<AttributeChange>,
        requires_replace: bool,
    ) -> Self {
        Self {
            planned_state,
            changes,
            requires_replace,
        }
    }
}

/// Plan a resource operation from its schema.
///
/// - `prior` absent: create. Every non-null configurable attribute is an
///   addition and computed attributes are unknown.
/// - `proposed` null: destroy. Every non-null prior attribute is removed.
/// - otherwise: update. Configurable attributes are compared; any changed
///   `force_new` attribute makes the plan a replacement.
pub fn plan_resource(schema: &Schema, prior: Option<&Value>, proposed: &Value) -> PlanResult {
    let prior = prior.filter(|p| !p.is_null());

    match prior {
        None => plan_create(schema, proposed),
        Some(prior) if proposed.is_null() => plan_destroy(prior),
        Some(prior) => plan_update(schema, prior, proposed),
    }
}

fn plan_create(schema: &Schema, proposed: &Value) -> PlanResult {
    let mut changes = Vec::new();
    for name in sorted_names(schema) {
        let attr = &schema.block.attributes[name];
        let value = field(proposed, name);
        if attr.is_configurable() && !value.is_null() {
            changes.push(AttributeChange::added(name, value));
        }
    }

    PlanResult::with_changes(planned_with_unknowns(schema, proposed), changes, false)
}

fn plan_destroy(prior: &Value) -> PlanResult {
    let mut changes: Vec<AttributeChange> = prior
        .as_object()
        .into_iter()
        .flatten()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| AttributeChange::removed(k.as_str(), v.clone()))
        .collect();
    changes.sort_by(|a, b| a.path.cmp(&b.path));

    PlanResult::with_changes(Value::Null, changes, false)
}

fn plan_update(schema: &Schema, prior: &Value, proposed: &Value) -> PlanResult {
    let mut changes = Vec::new();
    let mut requires_replace = false;

    for name in sorted_names(schema) {
        let attr = &schema.block.attributes[name];
        if !attr.is_configurable() {
            continue;
        }
        let before = field(prior, name);
        let after = field(proposed, name);
        if before != after {
            requires_replace |= attr.force_new;
            changes.push(AttributeChange::modified(name, before, after));
        }
    }

    if changes.is_empty() {
        return PlanResult::no_change(prior.clone());
    }

    let planned_state = if requires_replace {
        planned_for_replace(schema, proposed)
    } else {
        let mut planned = as_map(prior);
        for (name, attr) in &schema.block.attributes {
            if attr.is_configurable() {
                planned.insert(name.clone(), field(proposed, name));
            }
        }
        Value::Object(planned)
    };

    PlanResult::with_changes(planned_state, changes, requires_replace)
}

/// The proposed configuration with computed-only attributes it lacks set unknown.
fn planned_with_unknowns(schema: &Schema, proposed: &Value) -> Value {
    let mut planned = as_map(proposed);
    for (name, attr) in &schema.block.attributes {
        if !attr.is_configurable() {
            planned.entry(name.clone()).or_insert(Value::Null);
        }
    }
    Value::Object(planned)
}

/// The proposed configuration with every computed-only attribute unknown.
fn planned_for_replace(schema: &Schema, proposed: &Value) -> Value {
    let mut planned = as_map(proposed);
    for (name, attr) in &schema.block.attributes {
        if !attr.is_configurable() {
            planned.insert(name.clone(), Value::Null);
        }
    }
    Value::Object(planned)
}

fn sorted_names(schema: &Schema) -> Vec<&String> {
    let mut names: Vec<&String> = schema.block.attributes.keys().collect();
    names.sort();
    names
}

fn field(value: &Value, name: &str) -> Value {
    value.get(name).cloned().unwrap_or(Value::Null)
}

fn as_map(value: &Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}
