mod expand;
mod model;

pub use expand::{expand_linux_fx_version, flatten_application_stack};
pub use model::*;

use std::fmt;

use super::clients::{AppServiceClient, ClientBundle};
use super::id::{ServicePlanId, WebAppId};
use super::types::{BackupRequest, Site, SiteAuthSettings, SiteLogsConfig, SiteProperties};
use super::AzureError;
use crate::context::Context;
use crate::schema::{Attribute, Block, ResourceSchema, Timeouts};

pub const RESOURCE_TYPE: &str = "azurerm_linux_web_app";

const SITE_KIND: &str = "app,linux";

/// Where a web app is in its lifecycle. Every transition is one remote call that blocks until
/// ARM reports a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceLifecycle {
    Absent,
    Creating,
    Present,
    Updating,
    Deleting,
}

impl ResourceLifecycle {
    pub fn can_transition_to(self, next: ResourceLifecycle) -> bool {
        use ResourceLifecycle::*;
        matches!(
            (self, next),
            (Absent, Creating)
                | (Creating, Present)
                | (Present, Updating)
                | (Updating, Present)
                | (Present, Deleting)
                | (Deleting, Absent)
                | (Present, Absent)
        )
    }

    fn advance(self, id: &WebAppId, next: ResourceLifecycle) -> ResourceLifecycle {
        if self.can_transition_to(next) {
            tracing::info!(id = %id, from = %self, to = %next, "web app state change");
        } else {
            tracing::warn!(id = %id, from = %self, to = %next, "unexpected web app state change");
        }
        next
    }
}

impl fmt::Display for ResourceLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceLifecycle::Absent => "absent",
            ResourceLifecycle::Creating => "creating",
            ResourceLifecycle::Present => "present",
            ResourceLifecycle::Updating => "updating",
            ResourceLifecycle::Deleting => "deleting",
        };
        f.write_str(name)
    }
}

pub fn schema() -> ResourceSchema {
    let ip_restriction = Block::new(vec![
        Attribute::optional("ip_address"),
        Attribute::optional("service_tag"),
        Attribute::optional("virtual_network_subnet_id"),
        Attribute::optional("name"),
        Attribute::optional("priority"),
        Attribute::optional("action"),
        Attribute::optional("headers").block(Block::new(vec![
            Attribute::optional("x_azure_fdid"),
            Attribute::optional("x_fd_health_probe"),
            Attribute::optional("x_forwarded_for"),
            Attribute::optional("x_forwarded_host"),
        ])),
    ]);

    let auto_heal_setting = Block::new(vec![
        Attribute::optional("trigger").block(Block::new(vec![
            Attribute::optional("requests").block(Block::new(vec![
                Attribute::required("count"),
                Attribute::required("interval"),
            ])),
            Attribute::optional("slow_request").block(Block::new(vec![
                Attribute::required("time_taken"),
                Attribute::required("interval"),
                Attribute::required("count"),
                Attribute::optional("path"),
            ])),
            Attribute::optional("status_code").block(Block::new(vec![
                Attribute::required("status_code_range"),
                Attribute::optional("sub_status"),
                Attribute::optional("win32_status"),
                Attribute::required("count"),
                Attribute::required("interval"),
                Attribute::optional("path"),
            ])),
        ])),
        Attribute::optional("action").block(Block::new(vec![
            Attribute::required("action_type"),
            Attribute::optional_computed("minimum_process_execution_time"),
        ])),
    ]);

    let site_config = Block::new(vec![
        Attribute::optional("always_on"),
        Attribute::optional("app_command_line"),
        Attribute::optional("load_balancing_mode"),
        Attribute::optional("ftps_state"),
        Attribute::optional("http2_enabled"),
        Attribute::optional("minimum_tls_version"),
        Attribute::optional("health_check_path"),
        Attribute::optional("websockets_enabled"),
        Attribute::optional("application_stack").block(Block::new(vec![
            Attribute::optional("docker_image"),
            Attribute::optional("docker_image_tag"),
            Attribute::optional("dotnet_framework_version"),
            Attribute::optional("java_server"),
            Attribute::optional("java_server_version"),
            Attribute::optional("java_version"),
            Attribute::optional("node_version"),
            Attribute::optional("php_version"),
            Attribute::optional("python_version"),
        ])),
        Attribute::optional("ip_restriction").block(ip_restriction),
        Attribute::optional("auto_heal"),
        Attribute::optional("auto_heal_setting").block(auto_heal_setting),
        Attribute::computed("linux_fx_version"),
        Attribute::computed("detailed_error_logging"),
        Attribute::computed("virtual_application"),
    ]);

    let logs = Block::new(vec![
        Attribute::optional("detailed_error_messages"),
        Attribute::optional("failed_request_tracing"),
        Attribute::optional("application_logs").block(Block::new(vec![
            Attribute::optional("file_system_level"),
            Attribute::optional("azure_blob_storage").block(Block::new(vec![
                Attribute::required("level"),
                Attribute::required("sas_url").sensitive(),
                Attribute::required("retention_in_days"),
            ])),
        ])),
        Attribute::optional("http_logs").block(Block::new(vec![
            Attribute::optional("file_system").block(Block::new(vec![
                Attribute::required("retention_in_days"),
                Attribute::required("retention_in_mb"),
            ])),
            Attribute::optional("azure_blob_storage").block(Block::new(vec![
                Attribute::required("sas_url").sensitive(),
                Attribute::optional("retention_in_days"),
            ])),
        ])),
    ]);

    let oauth_provider = || {
        Block::new(vec![
            Attribute::required("client_id"),
            Attribute::required("client_secret").sensitive(),
            Attribute::optional("oauth_scopes"),
        ])
    };

    let auth_settings = Block::new(vec![
        Attribute::required("enabled"),
        Attribute::optional("additional_login_parameters"),
        Attribute::optional("allowed_external_redirect_urls"),
        Attribute::optional_computed("default_provider"),
        Attribute::optional("issuer"),
        Attribute::optional("token_refresh_extension_hours"),
        Attribute::optional("token_store_enabled"),
        Attribute::optional_computed("unauthenticated_client_action"),
        Attribute::optional("active_directory").block(Block::new(vec![
            Attribute::required("client_id"),
            Attribute::optional("client_secret").sensitive(),
            Attribute::optional("allowed_audiences"),
        ])),
        Attribute::optional("facebook").block(Block::new(vec![
            Attribute::required("app_id"),
            Attribute::required("app_secret").sensitive(),
            Attribute::optional("oauth_scopes"),
        ])),
        Attribute::optional("google").block(oauth_provider()),
        Attribute::optional("microsoft").block(oauth_provider()),
        Attribute::optional("twitter").block(Block::new(vec![
            Attribute::required("consumer_key"),
            Attribute::required("consumer_secret").sensitive(),
        ])),
    ]);

    let backup = Block::new(vec![
        Attribute::required("name"),
        Attribute::required("storage_account_url").sensitive(),
        Attribute::optional("enabled"),
        Attribute::required("schedule").block(Block::new(vec![
            Attribute::required("frequency_interval"),
            Attribute::required("frequency_unit"),
            Attribute::optional("keep_at_least_one_backup"),
            Attribute::optional("retention_period_days"),
            Attribute::optional_computed("start_time"),
        ])),
    ]);

    ResourceSchema {
        type_name: RESOURCE_TYPE,
        block: Block::new(vec![
            Attribute::required("name").force_new(),
            Attribute::required("resource_group_name").force_new(),
            Attribute::required("location").force_new(),
            Attribute::required("service_plan_id"),
            Attribute::optional("app_settings").sensitive(),
            Attribute::optional("enabled"),
            Attribute::optional("https_only"),
            Attribute::optional("client_affinity_enabled"),
            Attribute::optional_computed("site_config").block(site_config),
            Attribute::optional_computed("logs").block(logs),
            Attribute::optional_computed("auth_settings").block(auth_settings),
            Attribute::optional("backup").block(backup),
            Attribute::optional("tags"),
            Attribute::computed("id"),
            Attribute::computed("kind"),
            Attribute::computed("default_hostname"),
            Attribute::computed("outbound_ip_addresses"),
        ]),
        timeouts: Timeouts::default(),
    }
}

/// Web app names are 2-60 characters of letters, digits and hyphens, not starting or ending
/// with a hyphen.
pub fn validate_name(name: &str) -> Result<(), AzureError> {
    let valid_chars = name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    if !(2..=60).contains(&name.len())
        || !valid_chars
        || name.starts_with('-')
        || name.ends_with('-')
    {
        return Err(AzureError::validation(
            "name",
            format!(
                "{name:?} must be 2-60 letters, digits or hyphens and must not start or end with a hyphen"
            ),
        ));
    }
    Ok(())
}

/// Create/Read/Update/Delete for `azurerm_linux_web_app`.
#[derive(Debug, Clone)]
pub struct LinuxWebAppResource {
    client: AppServiceClient,
    subscription_id: String,
}

/// Request bodies built up front so that validation fails before the first remote call.
struct Expanded {
    site: Site,
    logs: Option<SiteLogsConfig>,
    auth_settings: Option<SiteAuthSettings>,
    backup: Option<BackupRequest>,
}

impl LinuxWebAppResource {
    pub fn new(clients: &ClientBundle) -> Self {
        Self {
            client: clients.app_service.clone(),
            subscription_id: clients.subscription_id.clone(),
        }
    }

    pub fn id_for(&self, model: &LinuxWebAppModel) -> Result<WebAppId, AzureError> {
        validate_name(&model.name)?;
        if model.resource_group_name.is_empty() {
            return Err(AzureError::validation(
                "resource_group_name",
                "must not be empty",
            ));
        }
        Ok(WebAppId::new(
            &self.subscription_id,
            &model.resource_group_name,
            &model.name,
        ))
    }

    fn expand(&self, model: &LinuxWebAppModel) -> Result<Expanded, AzureError> {
        if model.location.is_empty() {
            return Err(AzureError::validation("location", "must not be empty"));
        }
        let service_plan = ServicePlanId::parse(&model.service_plan_id)?;
        let site_config = expand::expand_site_config(
            model.site_config.as_ref().unwrap_or(&SiteConfigModel::default()),
        )?;

        let site = Site {
            kind: Some(SITE_KIND.to_string()),
            location: model.location.clone(),
            tags: model.tags.clone(),
            properties: Some(SiteProperties {
                server_farm_id: Some(service_plan.to_string()),
                enabled: Some(model.enabled),
                https_only: Some(model.https_only),
                client_affinity_enabled: Some(model.client_affinity_enabled),
                reserved: Some(true),
                site_config: Some(site_config),
                ..Default::default()
            }),
            ..Default::default()
        };

        Ok(Expanded {
            site,
            logs: model.logs.as_ref().map(expand::expand_logs),
            auth_settings: model.auth_settings.as_ref().map(expand::expand_auth_settings),
            backup: model.backup.as_ref().map(expand::expand_backup).transpose()?,
        })
    }

    /// Fails with `AlreadyExists` when a site with the same ID is already present.
    pub async fn create(
        &self,
        ctx: &Context,
        model: &LinuxWebAppModel,
    ) -> Result<LinuxWebAppModel, AzureError> {
        let id = self.id_for(model)?;
        let expanded = self.expand(model)?;

        match self.client.get(ctx, &id).await {
            Ok(_) => {
                return Err(AzureError::AlreadyExists { id: id.to_string() });
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        let state = ResourceLifecycle::Absent.advance(&id, ResourceLifecycle::Creating);

        self.client
            .create_or_update(ctx, &id, &expanded.site)
            .await?;

        if !model.app_settings.is_empty() {
            self.client
                .update_application_settings(ctx, &id, &model.app_settings)
                .await?;
        }
        self.write_sections(ctx, &id, &expanded).await?;

        state.advance(&id, ResourceLifecycle::Present);

        self.read(ctx, &id, Some(model))
            .await?
            .ok_or_else(|| AzureError::not_found(&id))
    }

    /// Rebuilds the configuration from ARM. `Ok(None)` means the web app no longer exists.
    ///
    /// `configured` supplies secrets the API does not return.
    pub async fn read(
        &self,
        ctx: &Context,
        id: &WebAppId,
        configured: Option<&LinuxWebAppModel>,
    ) -> Result<Option<LinuxWebAppModel>, AzureError> {
        let site = match self.client.get(ctx, id).await {
            Ok(site) => site,
            Err(e) if e.is_not_found() => {
                tracing::info!(id = %id, "web app not found, treating as removed");
                ResourceLifecycle::Present.advance(id, ResourceLifecycle::Absent);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let site_config = self
            .client
            .get_configuration(ctx, id)
            .await?
            .properties
            .unwrap_or_default();
        let app_settings = self
            .client
            .list_application_settings(ctx, id)
            .await?
            .properties
            .unwrap_or_default();
        let auth_settings = self
            .client
            .get_auth_settings(ctx, id)
            .await?
            .properties
            .unwrap_or_default();
        let logs = self
            .client
            .get_diagnostic_logs_configuration(ctx, id)
            .await?
            .properties
            .unwrap_or_default();
        let backup = match self.client.get_backup_configuration(ctx, id).await {
            Ok(envelope) => envelope.properties.map(|b| {
                expand::flatten_backup(&b, configured.and_then(|c| c.backup.as_ref()))
            }),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e),
        };

        let properties = site.properties.unwrap_or_default();
        let service_plan_id = properties
            .server_farm_id
            .map(|raw| {
                ServicePlanId::parse(&raw)
                    .map(|plan| plan.to_string())
                    .unwrap_or(raw)
            })
            .unwrap_or_default();

        Ok(Some(LinuxWebAppModel {
            name: id.site_name.clone(),
            resource_group_name: id.resource_group.clone(),
            location: normalize_location(&site.location),
            service_plan_id,
            app_settings,
            enabled: properties.enabled.unwrap_or(true),
            https_only: properties.https_only.unwrap_or_default(),
            client_affinity_enabled: properties.client_affinity_enabled.unwrap_or_default(),
            site_config: Some(expand::flatten_site_config(&site_config)),
            logs: Some(expand::flatten_logs(&logs)),
            auth_settings: Some(expand::flatten_auth_settings(
                &auth_settings,
                configured.and_then(|c| c.auth_settings.as_ref()),
            )),
            backup,
            tags: site.tags,
            id: id.to_string(),
            kind: site.kind.unwrap_or_default(),
            default_hostname: properties.default_host_name.unwrap_or_default(),
            outbound_ip_addresses: properties.outbound_ip_addresses.unwrap_or_default(),
        }))
    }

    /// Moving to another service plan happens in place.
    pub async fn update(
        &self,
        ctx: &Context,
        id: &WebAppId,
        model: &LinuxWebAppModel,
    ) -> Result<LinuxWebAppModel, AzureError> {
        let expanded = self.expand(model)?;
        let state = ResourceLifecycle::Present.advance(id, ResourceLifecycle::Updating);

        self.client
            .create_or_update(ctx, id, &expanded.site)
            .await?;
        self.client
            .update_application_settings(ctx, id, &model.app_settings)
            .await?;
        self.write_sections(ctx, id, &expanded).await?;

        if expanded.backup.is_none() {
            match self.client.get_backup_configuration(ctx, id).await {
                Ok(_) => {
                    tracing::debug!(id = %id, "removing backup configuration");
                    self.client.delete_backup_configuration(ctx, id).await?;
                }
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }

        state.advance(id, ResourceLifecycle::Present);

        self.read(ctx, id, Some(model))
            .await?
            .ok_or_else(|| AzureError::not_found(id))
    }

    /// A web app that is already gone counts as deleted. The service plan is left in place.
    pub async fn delete(&self, ctx: &Context, id: &WebAppId) -> Result<(), AzureError> {
        let state = ResourceLifecycle::Present.advance(id, ResourceLifecycle::Deleting);

        match self.client.delete(ctx, id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::debug!(id = %id, "web app already deleted");
            }
            Err(e) => return Err(e),
        }

        state.advance(id, ResourceLifecycle::Absent);
        Ok(())
    }

    async fn write_sections(
        &self,
        ctx: &Context,
        id: &WebAppId,
        expanded: &Expanded,
    ) -> Result<(), AzureError> {
        if let Some(auth_settings) = &expanded.auth_settings {
            self.client
                .update_auth_settings(ctx, id, auth_settings)
                .await?;
        }
        if let Some(logs) = &expanded.logs {
            self.client
                .update_diagnostic_logs_config(ctx, id, logs)
                .await?;
        }
        if let Some(backup) = &expanded.backup {
            self.client
                .update_backup_configuration(ctx, id, backup)
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::AttributeKind;

    #[test]
    fn test_lifecycle_transitions() {
        use ResourceLifecycle::*;
        assert!(Absent.can_transition_to(Creating));
        assert!(Creating.can_transition_to(Present));
        assert!(Present.can_transition_to(Updating));
        assert!(Updating.can_transition_to(Present));
        assert!(Present.can_transition_to(Deleting));
        assert!(Deleting.can_transition_to(Absent));
        assert!(Present.can_transition_to(Absent));

        assert!(!Absent.can_transition_to(Updating));
        assert!(!Deleting.can_transition_to(Present));
        assert!(!Creating.can_transition_to(Deleting));
    }

    #[test]
    fn test_lifecycle_display() {
        assert_eq!(ResourceLifecycle::Creating.to_string(), "creating");
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("acctestWA-1").is_ok());
        assert!(validate_name("a").is_err());
        assert!(validate_name("-leading").is_err());
        assert!(validate_name("trailing-").is_err());
        assert!(validate_name("under_score").is_err());
        assert!(validate_name(&"a".repeat(61)).is_err());
    }

    #[test]
    fn test_schema_force_new_attributes() {
        let schema = schema();
        for name in ["name", "resource_group_name", "location"] {
            assert!(schema.block.attribute(name).unwrap().force_new, "{name}");
        }
        assert!(!schema.block.attribute("service_plan_id").unwrap().force_new);
    }

    #[test]
    fn test_schema_computed_site_config_fields() {
        let schema = schema();
        let site_config = schema.block.attribute("site_config").unwrap();
        assert_eq!(site_config.kind, AttributeKind::OptionalComputed);
        let nested = site_config.nested.as_ref().unwrap();
        for name in ["linux_fx_version", "detailed_error_logging", "virtual_application"] {
            assert_eq!(nested.attribute(name).unwrap().kind, AttributeKind::Computed);
        }
    }

    #[test]
    fn test_schema_accepts_serialized_model() {
        let mut model = LinuxWebAppModel {
            name: "acctestWA-1".to_string(),
            resource_group_name: "rg".to_string(),
            location: "westeurope".to_string(),
            service_plan_id: "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Web/serverfarms/p"
                .to_string(),
            site_config: Some(SiteConfigModel::default()),
            logs: Some(LogsModel::default()),
            auth_settings: Some(AuthSettingsModel::default()),
            ..Default::default()
        };
        let value = serde_json::to_value(&model).unwrap();
        assert!(schema().validate(&value).is_ok());

        model.backup = Some(BackupModel::default());
        let value = serde_json::to_value(&model).unwrap();
        let errors = schema().validate(&value).unwrap_err();
        assert!(errors.contains(&"backup.name: required attribute is missing".to_string()));
        assert!(errors.iter().all(|e| e.starts_with("backup.")), "{errors:?}");
    }
}
