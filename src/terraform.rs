//! Plan and apply for a single resource instance.

pub mod plan;
pub mod state;

pub use plan::{AttributeChange, PlanAction, plan};
pub use state::{StateError, TerraformState};

use serde_json::Value;

use crate::context::Context;
use crate::providers::{Provider, ProviderError};
use crate::resource::Resource;

/// The outcome of refreshing one resource and comparing it with its configuration.
#[derive(Debug, Clone)]
pub struct PlannedChange {
    pub resource_type: String,
    /// Remote ID; for a create this is the ID the resource will get.
    pub id: String,
    pub desired: Value,
    pub observed: Option<Value>,
    pub action: PlanAction,
}

/// Validates `config`, refreshes the prior instance (if any) and plans the change.
///
/// Without a prior instance the plan is always a create, so an unmanaged resource with the
/// same ID surfaces as a requires-import error on apply rather than being adopted.
pub async fn refresh_and_plan(
    provider: &dyn Provider,
    ctx: &Context,
    resource_type: &str,
    config: &Value,
    prior: Option<&Resource>,
) -> Result<PlannedChange, ProviderError> {
    let schema = provider.schema(resource_type)?;
    schema
        .validate(config)
        .map_err(|errors| ProviderError::InvalidConfig(errors.join("; ")))?;

    let desired = provider.normalize(resource_type, config)?;
    let desired_id = provider.resource_id(resource_type, &desired)?;

    let (id, observed) = match prior.filter(|p| !p.resource_id.is_empty()) {
        Some(prior) => {
            let read_ctx = ctx.with_timeout(schema.timeouts.read);
            let observed = provider
                .read(&read_ctx, resource_type, &prior.resource_id, Some(&desired))
                .await?;
            if observed.is_none() {
                tracing::info!(id = %prior.resource_id, "resource removed outside of management, will be recreated");
            }
            (prior.resource_id.clone(), observed)
        }
        None => (desired_id.clone(), None),
    };

    let action = plan::plan(&schema, &desired, observed.as_ref());
    let id = match action {
        PlanAction::Create => desired_id,
        _ => id,
    };

    tracing::debug!(
        resource_type,
        id = %id,
        action = action.label(),
        changes = action.changes().len(),
        "planned resource change"
    );

    Ok(PlannedChange {
        resource_type: resource_type.to_string(),
        id,
        desired,
        observed,
        action,
    })
}

/// Carries out a planned change and returns the resulting state.
pub async fn apply(
    provider: &dyn Provider,
    ctx: &Context,
    planned: &PlannedChange,
) -> Result<Value, ProviderError> {
    let schema = provider.schema(&planned.resource_type)?;
    let resource_type = planned.resource_type.as_str();

    match &planned.action {
        PlanAction::NoOp => match &planned.observed {
            Some(observed) => Ok(observed.clone()),
            None => Err(ProviderError::NotFound(planned.id.clone())),
        },
        PlanAction::Create => {
            let ctx = ctx.with_timeout(schema.timeouts.create);
            provider.create(&ctx, resource_type, &planned.desired).await
        }
        PlanAction::Update(_) => {
            let ctx = ctx.with_timeout(schema.timeouts.update);
            provider
                .update(&ctx, resource_type, &planned.id, &planned.desired)
                .await
        }
        PlanAction::Replace(_) => {
            let delete_ctx = ctx.with_timeout(schema.timeouts.delete);
            provider
                .delete(&delete_ctx, resource_type, &planned.id)
                .await?;
            let create_ctx = ctx.with_timeout(schema.timeouts.create);
            provider
                .create(&create_ctx, resource_type, &planned.desired)
                .await
        }
    }
}

/// Deletes a managed instance.
pub async fn destroy(
    provider: &dyn Provider,
    ctx: &Context,
    resource_type: &str,
    id: &str,
) -> Result<(), ProviderError> {
    let schema = provider.schema(resource_type)?;
    let ctx = ctx.with_timeout(schema.timeouts.delete);
    provider.delete(&ctx, resource_type, id).await
}
