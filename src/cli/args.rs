use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(flatten)]
    pub azure: AzureArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Connection settings shared by every command that talks to Azure.
#[derive(clap::Args, Debug, Clone)]
pub struct AzureArgs {
    #[arg(long, global = true, env = "ARM_SUBSCRIPTION_ID")]
    pub subscription_id: Option<String>,

    #[arg(long, global = true, env = "ARM_TENANT_ID")]
    pub tenant_id: Option<String>,

    #[arg(long, global = true, env = "ARM_CLIENT_ID")]
    pub client_id: Option<String>,

    #[arg(long, global = true, env = "ARM_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Pre-acquired bearer token; takes precedence over the service principal settings
    #[arg(long, global = true, env = "ARM_ACCESS_TOKEN", hide_env_values = true, hide = true)]
    pub access_token: Option<String>,

    /// public, usgovernment or china
    #[arg(long, global = true, env = "ARM_ENVIRONMENT", default_value = "public")]
    pub environment: String,

    /// Resource Manager endpoint override
    #[arg(long, global = true, env = "ARM_ENDPOINT")]
    pub endpoint: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inspect Azure resource IDs
    Id {
        #[command(subcommand)]
        command: IdCommand,
    },
    /// Manage azurerm_linux_web_app resources
    WebApp {
        #[command(subcommand)]
        command: WebAppCommand,
    },
    AppConfiguration {
        #[command(subcommand)]
        command: AppConfigurationCommand,
    },
    Logic {
        #[command(subcommand)]
        command: LogicCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum IdCommand {
    /// Print the segments of a resource ID as a tree
    Parse { id: String },
}

#[derive(Subcommand, Debug)]
pub enum WebAppCommand {
    /// Refresh a web app and print its state
    Read(IdArgs),
    /// Show the changes needed to reach the configuration
    Plan(PlanArgs),
    /// Plan and carry out the changes
    Apply(PlanArgs),
    Destroy(IdArgs),
    /// Print an import block for an existing web app
    Import(ImportArgs),
}

#[derive(Subcommand, Debug)]
pub enum AppConfigurationCommand {
    /// Resolve the data-plane endpoint of a configuration store
    Endpoint(IdArgs),
}

#[derive(Subcommand, Debug)]
pub enum LogicCommand {
    /// List the workflows in a resource group
    Workflows {
        #[arg(long)]
        resource_group_id: String,
    },
}

#[derive(clap::Args, Debug)]
pub struct IdArgs {
    #[arg(long)]
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct PlanArgs {
    /// JSON file holding the resource configuration
    #[arg(long)]
    pub config: PathBuf,

    /// Terraform state file (format version 4) holding the prior instance
    #[arg(long)]
    pub state: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    #[arg(long)]
    pub id: String,

    /// Local name used in the import address
    #[arg(long, default_value = "this")]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serial_test::serial;

    const ARM_VARS: [&str; 7] = [
        "ARM_SUBSCRIPTION_ID",
        "ARM_TENANT_ID",
        "ARM_CLIENT_ID",
        "ARM_CLIENT_SECRET",
        "ARM_ACCESS_TOKEN",
        "ARM_ENVIRONMENT",
        "ARM_ENDPOINT",
    ];

    fn clear_arm_env() -> Vec<(&'static str, String)> {
        let backup = ARM_VARS
            .iter()
            .filter_map(|name| std::env::var(name).ok().map(|value| (*name, value)))
            .collect();
        unsafe {
            for name in ARM_VARS {
                std::env::remove_var(name);
            }
        }
        backup
    }

    fn restore_arm_env(backup: Vec<(&'static str, String)>) {
        unsafe {
            for name in ARM_VARS {
                std::env::remove_var(name);
            }
            for (name, value) in backup {
                std::env::set_var(name, value);
            }
        }
    }

    #[test]
    fn test_id_parse_positional() {
        let cli = Cli::parse_from([
            "azrm",
            "id",
            "parse",
            "/subscriptions/s/resourceGroups/g/providers/Microsoft.Web/sites/a",
        ]);

        if let Command::Id {
            command: IdCommand::Parse { id },
        } = cli.command
        {
            assert!(id.ends_with("sites/a"));
        } else {
            panic!("Expected Id Parse command, got {:?}", cli.command);
        }
    }

    #[test]
    fn test_plan_args_config_and_state() {
        let cli = Cli::parse_from([
            "azrm",
            "web-app",
            "plan",
            "--config=app.json",
            "--state=terraform.tfstate",
        ]);

        if let Command::WebApp {
            command: WebAppCommand::Plan(args),
        } = cli.command
        {
            assert_eq!(args.config, PathBuf::from("app.json"));
            assert_eq!(args.state, Some(PathBuf::from("terraform.tfstate")));
        } else {
            panic!("Expected WebApp Plan command, got {:?}", cli.command);
        }
    }

    #[test]
    fn test_import_default_name() {
        let cli = Cli::parse_from(["azrm", "web-app", "import", "--id=/subscriptions/s"]);

        if let Command::WebApp {
            command: WebAppCommand::Import(args),
        } = cli.command
        {
            assert_eq!(args.name, "this");
        } else {
            panic!("Expected WebApp Import command, got {:?}", cli.command);
        }
    }

    #[test]
    fn test_plan_requires_config() {
        assert!(Cli::try_parse_from(["azrm", "web-app", "plan"]).is_err());
    }

    #[test]
    fn test_global_args_after_subcommand() {
        let cli = Cli::parse_from([
            "azrm",
            "web-app",
            "read",
            "--id=x",
            "--subscription-id=sub-from-flag",
        ]);
        assert_eq!(cli.azure.subscription_id, Some("sub-from-flag".to_string()));
    }

    #[test]
    #[serial]
    fn test_azure_args_no_env_provided() {
        let backup = clear_arm_env();

        let cli = Cli::parse_from(["azrm", "logic", "workflows", "--resource-group-id=rg"]);

        restore_arm_env(backup);

        assert!(cli.azure.subscription_id.is_none());
        assert!(cli.azure.client_secret.is_none());
        assert!(cli.azure.access_token.is_none());
        assert_eq!(cli.azure.environment, "public");
    }

    #[test]
    #[serial]
    fn test_azure_args_from_env_var_fallback() {
        let backup = clear_arm_env();
        unsafe {
            std::env::set_var("ARM_SUBSCRIPTION_ID", "env-sub");
            std::env::set_var("ARM_TENANT_ID", "env-tenant");
            std::env::set_var("ARM_CLIENT_ID", "env-client");
            std::env::set_var("ARM_CLIENT_SECRET", "env-secret");
            std::env::set_var("ARM_ENVIRONMENT", "china");
        }

        let cli = Cli::parse_from(["azrm", "web-app", "read", "--id=x"]);

        restore_arm_env(backup);

        assert_eq!(cli.azure.subscription_id, Some("env-sub".to_string()));
        assert_eq!(cli.azure.tenant_id, Some("env-tenant".to_string()));
        assert_eq!(cli.azure.client_id, Some("env-client".to_string()));
        assert_eq!(cli.azure.client_secret, Some("env-secret".to_string()));
        assert_eq!(cli.azure.environment, "china");
    }

    #[test]
    #[serial]
    fn test_cli_flag_takes_precedence_over_env() {
        let backup = clear_arm_env();
        unsafe {
            std::env::set_var("ARM_SUBSCRIPTION_ID", "env-sub");
        }

        let cli = Cli::parse_from([
            "azrm",
            "--subscription-id=cli-sub",
            "web-app",
            "read",
            "--id=x",
        ]);

        restore_arm_env(backup);

        assert_eq!(cli.azure.subscription_id, Some("cli-sub".to_string()));
    }
}
