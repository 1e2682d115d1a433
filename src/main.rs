mod cli;

use std::path::Path;

use azrm::output;
use azrm::providers::azure::linux_web_app::RESOURCE_TYPE;
use azrm::providers::azure::{ResourceGroupId, WebAppId};
use azrm::terraform::{self, TerraformState};
use azrm::{
    AzrmError, AzureError, AzureProvider, Context, Provider, ProviderError, Resource, ResourceId,
};
use clap::Parser;
use color_eyre::eyre::Result;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use cli::{
    AppConfigurationCommand, AzureArgs, Cli, Command, IdCommand, ImportArgs, LogicCommand,
    PlanArgs, WebAppCommand,
};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let Cli { azure, command } = Cli::parse();

    let ctx = Context::background();
    let interrupt = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling in-flight operations");
            interrupt.cancel();
        }
    });

    match command {
        Command::Id {
            command: IdCommand::Parse { id },
        } => {
            let id = ResourceId::parse(&id).map_err(ProviderError::from)?;
            println!("{}", output::id_tree(&id));
        }
        Command::WebApp {
            command: WebAppCommand::Import(args),
        } => print_import(args)?,
        Command::WebApp { command } => {
            let provider = connect(&azure)?;
            run_web_app(&provider, &ctx, command).await?;
        }
        Command::AppConfiguration {
            command: AppConfigurationCommand::Endpoint(args),
        } => {
            let provider = connect(&azure)?;
            let client = provider
                .clients()
                .app_configuration
                .data_plane_client(&ctx, &args.id)
                .await
                .map_err(ProviderError::from)?;
            println!("{}", client.endpoint());
        }
        Command::Logic {
            command: LogicCommand::Workflows { resource_group_id },
        } => {
            let provider = connect(&azure)?;
            let resource_group =
                ResourceGroupId::parse(&resource_group_id).map_err(ProviderError::from)?;
            let workflows = provider
                .clients()
                .logic
                .workflows
                .list_by_resource_group(&ctx, &resource_group)
                .await
                .map_err(ProviderError::from)?;
            tracing::info!(count = workflows.len(), "listed workflows");
            for workflow in workflows {
                println!("{}", workflow.id.unwrap_or_default());
            }
        }
    }

    Ok(())
}

fn connect(azure: &AzureArgs) -> Result<AzureProvider, AzrmError> {
    let options = azure.client_options()?;
    tracing::debug!(?options, "connecting to Azure Resource Manager");
    Ok(AzureProvider::new(&options).map_err(ProviderError::from)?)
}

async fn run_web_app(
    provider: &dyn Provider,
    ctx: &Context,
    command: WebAppCommand,
) -> Result<(), AzrmError> {
    match command {
        WebAppCommand::Read(args) => {
            match provider.read(ctx, RESOURCE_TYPE, &args.id, None).await? {
                Some(state) => println!("{}", to_pretty(&state)?),
                None => println!("{} does not exist", args.id),
            }
        }
        WebAppCommand::Plan(args) => {
            let planned = plan(provider, ctx, &args).await?;
            print_plan(&planned);
        }
        WebAppCommand::Apply(args) => {
            let planned = plan(provider, ctx, &args).await?;
            print_plan(&planned);
            if !planned.action.is_noop() {
                let state = terraform::apply(provider, ctx, &planned).await?;
                tracing::info!(id = %planned.id, action = planned.action.label(), "apply complete");
                println!("{}", to_pretty(&state)?);
            }
        }
        WebAppCommand::Destroy(args) => {
            terraform::destroy(provider, ctx, RESOURCE_TYPE, &args.id).await?;
            println!("{} destroyed", args.id);
        }
        WebAppCommand::Import(args) => print_import(args)?,
    }
    Ok(())
}

fn print_import(args: ImportArgs) -> Result<(), AzrmError> {
    let id = WebAppId::parse(&args.id).map_err(ProviderError::from)?;
    let resource = Resource {
        resource_type: RESOURCE_TYPE.to_string(),
        name: args.name,
        resource_id: id.to_string(),
        attributes: Value::Null,
    };
    println!("{}", azrm::import_block(&resource));
    Ok(())
}

async fn plan(
    provider: &dyn Provider,
    ctx: &Context,
    args: &PlanArgs,
) -> Result<terraform::PlannedChange, AzrmError> {
    let config = read_config(&args.config)?;

    let state = args.state.as_deref().map(TerraformState::from_path).transpose()?;
    let prior = match &state {
        Some(state) => {
            let id = provider.resource_id(RESOURCE_TYPE, &config)?;
            prior_instance(state, &id)
        }
        None => None,
    };

    Ok(terraform::refresh_and_plan(provider, ctx, RESOURCE_TYPE, &config, prior).await?)
}

/// The instance with the configuration's ID, or the only web app in the state.
fn prior_instance<'a>(state: &'a TerraformState, id: &str) -> Option<&'a Resource> {
    if let Some(found) = state.find_by_id(RESOURCE_TYPE, id) {
        return Some(found);
    }
    let mut candidates = state.resources_of_type(RESOURCE_TYPE);
    match (candidates.next(), candidates.next()) {
        (Some(only), None) => Some(only),
        _ => None,
    }
}

fn read_config(path: &Path) -> Result<Value, AzrmError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| AzrmError::Config(format!("{}: {}", path.display(), e)))
}

fn to_pretty(value: &Value) -> Result<String, AzrmError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| AzrmError::Provider(ProviderError::from(AzureError::from(e))))
}

fn print_plan(planned: &terraform::PlannedChange) {
    println!("{}", output::plan_summary(planned));
    if let Some(table) = output::plan_table(planned) {
        println!("{}", table);
    }
}
