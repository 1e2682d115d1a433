//! Human-readable rendering of plans and resource IDs.

use serde_json::Value;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use termtree::Tree;

use crate::providers::azure::ResourceId;
use crate::terraform::{PlanAction, PlannedChange};

const SENSITIVE: &str = "(sensitive)";

#[derive(Tabled)]
struct ChangeRow {
    #[tabled(rename = "Attribute")]
    path: String,
    #[tabled(rename = "Before")]
    before: String,
    #[tabled(rename = "After")]
    after: String,
    #[tabled(rename = "Forces replacement")]
    force_new: String,
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) if s.is_empty() => "-".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn plan_summary(planned: &PlannedChange) -> String {
    let verb = match &planned.action {
        PlanAction::NoOp => "is up to date",
        PlanAction::Create => "will be created",
        PlanAction::Update(_) => "will be updated in-place",
        PlanAction::Replace(_) => "must be replaced",
    };
    format!("{} {} {}", planned.resource_type, planned.id, verb)
}

/// One row per changed attribute; sensitive values are masked.
pub fn plan_table(planned: &PlannedChange) -> Option<String> {
    let changes = planned.action.changes();
    if changes.is_empty() {
        return None;
    }

    let rows: Vec<ChangeRow> = changes
        .iter()
        .map(|change| {
            let (before, after) = if change.sensitive {
                (SENSITIVE.to_string(), SENSITIVE.to_string())
            } else {
                (render_value(&change.before), render_value(&change.after))
            };
            ChangeRow {
                path: change.path.clone(),
                before,
                after,
                force_new: if change.force_new { "yes" } else { "" }.to_string(),
            }
        })
        .collect();

    Some(Table::new(rows).with(Style::rounded()).to_string())
}

pub fn id_tree(id: &ResourceId) -> Tree<String> {
    let mut leaf = Tree::new(format!("{}: {}", id.resource_type, id.name));

    let mut nested: Option<Tree<String>> = None;
    for (resource_type, name) in id.children.iter().rev() {
        let mut node = Tree::new(format!("{}: {}", resource_type, name));
        if let Some(child) = nested.take() {
            node.push(child);
        }
        nested = Some(node);
    }
    if let Some(child) = nested {
        leaf.push(child);
    }

    let provider = Tree::new(format!("provider: {}", id.provider)).with_leaves([leaf]);
    let resource_group =
        Tree::new(format!("resource group: {}", id.resource_group)).with_leaves([provider]);
    Tree::new(format!("subscription: {}", id.subscription_id)).with_leaves([resource_group])
}
