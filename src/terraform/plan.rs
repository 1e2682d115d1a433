//! Desired-versus-observed comparison.
//!
//! Stands in for the host's diff engine: walks the resource schema, skips what the server owns
//! and reports which attributes differ and whether any of them forces replacement.

use serde_json::Value;

use crate::schema::{AttributeKind, Block, ResourceSchema, is_empty, join};

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeChange {
    /// Dotted path, list elements by index (`site_config.ip_restriction.0.priority`).
    pub path: String,
    pub before: Value,
    pub after: Value,
    pub force_new: bool,
    pub sensitive: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlanAction {
    NoOp,
    Create,
    Update(Vec<AttributeChange>),
    Replace(Vec<AttributeChange>),
}

impl PlanAction {
    pub fn changes(&self) -> &[AttributeChange] {
        match self {
            PlanAction::Update(changes) | PlanAction::Replace(changes) => changes,
            PlanAction::NoOp | PlanAction::Create => &[],
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, PlanAction::NoOp)
    }

    pub fn label(&self) -> &'static str {
        match self {
            PlanAction::NoOp => "no-op",
            PlanAction::Create => "create",
            PlanAction::Update(_) => "update",
            PlanAction::Replace(_) => "replace",
        }
    }
}

/// `observed` of `None` means the resource does not exist.
pub fn plan(schema: &ResourceSchema, desired: &Value, observed: Option<&Value>) -> PlanAction {
    let Some(observed) = observed else {
        return PlanAction::Create;
    };

    let changes = diff(schema, desired, observed);
    if changes.is_empty() {
        PlanAction::NoOp
    } else if changes.iter().any(|c| c.force_new) {
        PlanAction::Replace(changes)
    } else {
        PlanAction::Update(changes)
    }
}

pub fn diff(schema: &ResourceSchema, desired: &Value, observed: &Value) -> Vec<AttributeChange> {
    let mut changes = Vec::new();
    diff_block(&schema.block, desired, observed, "", false, false, &mut changes);
    changes
}

fn diff_block(
    block: &Block,
    desired: &Value,
    observed: &Value,
    path: &str,
    force_new: bool,
    sensitive: bool,
    changes: &mut Vec<AttributeChange>,
) {
    for attribute in &block.attributes {
        if attribute.kind == AttributeKind::Computed {
            continue;
        }

        let after = desired.get(attribute.name).unwrap_or(&Value::Null);
        let before = observed.get(attribute.name).unwrap_or(&Value::Null);

        if attribute.kind == AttributeKind::OptionalComputed && is_empty(after) {
            continue;
        }

        let attribute_path = join(path, attribute.name);
        let force_new = force_new || attribute.force_new;
        let sensitive = sensitive || attribute.sensitive;

        match (&attribute.nested, after, before) {
            (Some(nested), Value::Object(_), Value::Object(_)) => {
                diff_block(nested, after, before, &attribute_path, force_new, sensitive, changes);
            }
            (Some(nested), Value::Array(desired_items), Value::Array(observed_items))
                if desired_items.len() == observed_items.len() =>
            {
                for (index, (d, o)) in desired_items.iter().zip(observed_items).enumerate() {
                    let element_path = format!("{}.{}", attribute_path, index);
                    diff_block(nested, d, o, &element_path, force_new, sensitive, changes);
                }
            }
            (nested, _, _) => {
                if !equivalent(after, before) {
                    let sensitive =
                        sensitive || nested.as_ref().is_some_and(Block::contains_sensitive);
                    changes.push(AttributeChange {
                        path: attribute_path,
                        before: before.clone(),
                        after: after.clone(),
                        force_new,
                        sensitive,
                    });
                }
            }
        }
    }
}

fn equivalent(a: &Value, b: &Value) -> bool {
    (is_empty(a) && is_empty(b)) || a == b
}
