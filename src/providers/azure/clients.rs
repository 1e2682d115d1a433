//! Per-service client bundle.
//!
//! Built once per provider configuration and shared read-only by every resource operation.
//! Construction never touches the network.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;

use super::AzureError;
use super::auth::{CloudEnvironment, TokenCredential, default_scope};
use super::client::{ArmClient, TransportOptions};
use super::id::{ConfigurationStoreId, LOGIC_NAMESPACE, ResourceGroupId, ResourceId, WebAppId};
use super::types::{
    BackupRequest, ConfigurationStore, Envelope, GenericResource, Site, SiteAuthSettings,
    SiteConfig, SiteLogsConfig, StringDictionary,
};
use crate::context::Context;

pub const WEB_API_VERSION: &str = "2021-02-01";
pub const APP_CONFIGURATION_API_VERSION: &str = "2020-06-01";
pub const APP_CONFIGURATION_DATA_API_VERSION: &str = "1.0";
pub const LOGIC_API_VERSION: &str = "2019-05-01";

#[derive(Clone)]
pub struct ClientOptions {
    pub subscription_id: String,
    pub environment: CloudEnvironment,
    pub resource_manager_endpoint: String,
    pub credential: Arc<dyn TokenCredential>,
    pub transport: TransportOptions,
}

impl ClientOptions {
    pub fn new(
        subscription_id: String,
        environment: CloudEnvironment,
        credential: Arc<dyn TokenCredential>,
    ) -> Self {
        Self {
            subscription_id,
            environment,
            resource_manager_endpoint: environment.resource_manager_endpoint().to_string(),
            credential,
            transport: TransportOptions::default(),
        }
    }

    /// NOTE: Primarily used for testing with mock servers.
    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.resource_manager_endpoint = endpoint;
        self
    }

    pub fn with_transport(mut self, transport: TransportOptions) -> Self {
        self.transport = transport;
        self
    }

    fn arm_client(&self) -> Result<ArmClient, AzureError> {
        ArmClient::with_options(
            self.resource_manager_endpoint.clone(),
            Arc::clone(&self.credential),
            self.transport.clone(),
        )
    }
}

impl std::fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientOptions")
            .field("subscription_id", &self.subscription_id)
            .field("environment", &self.environment)
            .field("resource_manager_endpoint", &self.resource_manager_endpoint)
            .field("credential", &"[REDACTED]")
            .finish()
    }
}

// TODO: cache data plane clients per configuration store once invalidation on store
// deletion is defined.
#[derive(Debug, Clone)]
pub struct ClientBundle {
    pub subscription_id: String,
    pub app_service: AppServiceClient,
    pub app_configuration: AppConfigurationClient,
    pub logic: LogicClient,
}

impl ClientBundle {
    pub fn new(options: &ClientOptions) -> Result<Self, AzureError> {
        let arm = options.arm_client()?;

        Ok(Self {
            subscription_id: options.subscription_id.clone(),
            app_service: AppServiceClient { arm: arm.clone() },
            app_configuration: AppConfigurationClient {
                arm: arm.clone(),
                credential: Arc::clone(&options.credential),
                transport: options.transport.clone(),
            },
            logic: LogicClient::new(arm),
        })
    }
}

/// `Microsoft.Web/sites` and its `config/*` sub-resources.
#[derive(Debug, Clone)]
pub struct AppServiceClient {
    arm: ArmClient,
}

impl AppServiceClient {
    pub async fn get(&self, ctx: &Context, id: &WebAppId) -> Result<Site, AzureError> {
        self.arm.get(ctx, &id.to_string(), WEB_API_VERSION).await
    }

    pub async fn create_or_update(
        &self,
        ctx: &Context,
        id: &WebAppId,
        site: &Site,
    ) -> Result<Site, AzureError> {
        self.arm.put(ctx, &id.to_string(), WEB_API_VERSION, site).await
    }

    pub async fn delete(&self, ctx: &Context, id: &WebAppId) -> Result<(), AzureError> {
        self.arm
            .delete(
                ctx,
                &id.to_string(),
                WEB_API_VERSION,
                &[("deleteMetrics", "true"), ("deleteEmptyServerFarm", "false")],
            )
            .await
    }

    pub async fn get_configuration(
        &self,
        ctx: &Context,
        id: &WebAppId,
    ) -> Result<Envelope<SiteConfig>, AzureError> {
        self.arm
            .get(ctx, &config_path(id, "web"), WEB_API_VERSION)
            .await
    }

    pub async fn list_application_settings(
        &self,
        ctx: &Context,
        id: &WebAppId,
    ) -> Result<StringDictionary, AzureError> {
        self.arm
            .post(ctx, &config_path(id, "appsettings/list"), WEB_API_VERSION)
            .await
    }

    pub async fn update_application_settings(
        &self,
        ctx: &Context,
        id: &WebAppId,
        settings: &BTreeMap<String, String>,
    ) -> Result<StringDictionary, AzureError> {
        let body = StringDictionary::new(settings.clone());
        self.arm
            .put(ctx, &config_path(id, "appsettings"), WEB_API_VERSION, &body)
            .await
    }

    pub async fn get_diagnostic_logs_configuration(
        &self,
        ctx: &Context,
        id: &WebAppId,
    ) -> Result<Envelope<SiteLogsConfig>, AzureError> {
        self.arm
            .get(ctx, &config_path(id, "logs"), WEB_API_VERSION)
            .await
    }

    pub async fn update_diagnostic_logs_config(
        &self,
        ctx: &Context,
        id: &WebAppId,
        logs: &SiteLogsConfig,
    ) -> Result<Envelope<SiteLogsConfig>, AzureError> {
        let body = Envelope::new(logs.clone());
        self.arm
            .put(ctx, &config_path(id, "logs"), WEB_API_VERSION, &body)
            .await
    }

    pub async fn get_auth_settings(
        &self,
        ctx: &Context,
        id: &WebAppId,
    ) -> Result<Envelope<SiteAuthSettings>, AzureError> {
        self.arm
            .post(ctx, &config_path(id, "authsettings/list"), WEB_API_VERSION)
            .await
    }

    pub async fn update_auth_settings(
        &self,
        ctx: &Context,
        id: &WebAppId,
        settings: &SiteAuthSettings,
    ) -> Result<Envelope<SiteAuthSettings>, AzureError> {
        let body = Envelope::new(settings.clone());
        self.arm
            .put(ctx, &config_path(id, "authsettings"), WEB_API_VERSION, &body)
            .await
    }

    pub async fn get_backup_configuration(
        &self,
        ctx: &Context,
        id: &WebAppId,
    ) -> Result<Envelope<BackupRequest>, AzureError> {
        self.arm
            .post(ctx, &config_path(id, "backup/list"), WEB_API_VERSION)
            .await
    }

    pub async fn update_backup_configuration(
        &self,
        ctx: &Context,
        id: &WebAppId,
        backup: &BackupRequest,
    ) -> Result<Envelope<BackupRequest>, AzureError> {
        let body = Envelope::new(backup.clone());
        self.arm
            .put(ctx, &config_path(id, "backup"), WEB_API_VERSION, &body)
            .await
    }

    pub async fn delete_backup_configuration(
        &self,
        ctx: &Context,
        id: &WebAppId,
    ) -> Result<(), AzureError> {
        self.arm
            .delete(ctx, &config_path(id, "backup"), WEB_API_VERSION, &[])
            .await
    }
}

fn config_path(id: &WebAppId, section: &str) -> String {
    format!("{}/config/{}", id, section)
}

/// `Microsoft.AppConfiguration/configurationStores`.
#[derive(Clone)]
pub struct AppConfigurationClient {
    arm: ArmClient,
    credential: Arc<dyn TokenCredential>,
    transport: TransportOptions,
}

impl AppConfigurationClient {
    pub async fn get(
        &self,
        ctx: &Context,
        id: &ConfigurationStoreId,
    ) -> Result<ConfigurationStore, AzureError> {
        self.arm
            .get(ctx, &id.to_string(), APP_CONFIGURATION_API_VERSION)
            .await
    }

    /// Resolves a configuration store to a client for its data plane endpoint.
    ///
    /// Issues one management-plane Get per call; nothing is cached.
    pub async fn data_plane_client(
        &self,
        ctx: &Context,
        configuration_store_id: &str,
    ) -> Result<DataPlaneClient, AzureError> {
        let id = ConfigurationStoreId::parse(configuration_store_id)?;

        let store = self.get(ctx, &id).await.map_err(|e| {
            if e.is_not_found() {
                AzureError::not_found(format!("App Configuration {}", id))
            } else {
                e
            }
        })?;

        let endpoint = store
            .properties
            .and_then(|p| p.endpoint)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AzureError::not_found(format!("endpoint for App Configuration {}", id)))?;

        let scope = default_scope(&endpoint);
        ctx.run(self.credential.get_token(&scope))
            .await
            .map_err(|reason| AzureError::interrupted(reason, "data plane token"))?
            .map_err(|e| match e {
                AzureError::Auth { .. } => e,
                other => AzureError::Auth {
                    message: other.to_string(),
                },
            })?;

        tracing::debug!(store = %id.configuration_store_name, %endpoint, "resolved data plane endpoint");

        let client = ArmClient::with_options(
            endpoint.clone(),
            Arc::clone(&self.credential),
            self.transport.clone(),
        )?
        .with_scope(scope);

        Ok(DataPlaneClient { endpoint, client })
    }
}

impl std::fmt::Debug for AppConfigurationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfigurationClient")
            .field("arm", &self.arm)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KeyValue {
    pub key: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub locked: Option<bool>,
}

/// Client for one App Configuration store's own REST API.
#[derive(Debug, Clone)]
pub struct DataPlaneClient {
    endpoint: String,
    client: ArmClient,
}

impl DataPlaneClient {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn get_key_value(
        &self,
        ctx: &Context,
        key: &str,
        label: Option<&str>,
    ) -> Result<KeyValue, AzureError> {
        let encoded: String = url::form_urlencoded::byte_serialize(key.as_bytes()).collect();
        let path = format!("/kv/{}", encoded);
        let query: Vec<(&str, &str)> = label.map(|l| ("label", l)).into_iter().collect();
        self.client
            .get_with_query(ctx, &path, APP_CONFIGURATION_DATA_API_VERSION, &query)
            .await
    }
}

/// Typed access to one ARM resource collection.
#[derive(Debug, Clone)]
pub struct ResourceClient {
    arm: ArmClient,
    provider: &'static str,
    /// Type segments from the provider down, e.g. `["integrationAccounts", "certificates"]`.
    types: &'static [&'static str],
    api_version: &'static str,
}

impl ResourceClient {
    fn new(
        arm: ArmClient,
        provider: &'static str,
        types: &'static [&'static str],
        api_version: &'static str,
    ) -> Self {
        Self {
            arm,
            provider,
            types,
            api_version,
        }
    }

    pub fn type_path(&self) -> String {
        format!("{}/{}", self.provider, self.types.join("/"))
    }

    fn check(&self, id: &ResourceId) -> Result<(), AzureError> {
        if id.type_path() == self.type_path() {
            Ok(())
        } else {
            Err(AzureError::malformed(
                &id.to_string(),
                format!("expected a {} ID", self.type_path()),
            ))
        }
    }

    pub async fn get(&self, ctx: &Context, id: &ResourceId) -> Result<GenericResource, AzureError> {
        self.check(id)?;
        self.arm.get(ctx, &id.to_string(), self.api_version).await
    }

    pub async fn delete(&self, ctx: &Context, id: &ResourceId) -> Result<(), AzureError> {
        self.check(id)?;
        self.arm
            .delete(ctx, &id.to_string(), self.api_version, &[])
            .await
    }

    /// Lists a top-level collection within a resource group.
    pub async fn list_by_resource_group(
        &self,
        ctx: &Context,
        resource_group: &ResourceGroupId,
    ) -> Result<Vec<GenericResource>, AzureError> {
        if self.types.len() != 1 {
            return Err(AzureError::validation(
                "resource_group",
                format!("{} is a nested collection", self.type_path()),
            ));
        }
        let path = format!(
            "{}/providers/{}/{}",
            resource_group, self.provider, self.types[0]
        );
        self.arm.list(ctx, &path, self.api_version).await
    }

    /// Lists a nested collection below `parent`.
    pub async fn list_by_parent(
        &self,
        ctx: &Context,
        parent: &ResourceId,
    ) -> Result<Vec<GenericResource>, AzureError> {
        let expected_parent = format!(
            "{}/{}",
            self.provider,
            self.types[..self.types.len().saturating_sub(1)].join("/")
        );
        if self.types.len() < 2 || parent.type_path() != expected_parent {
            return Err(AzureError::malformed(
                &parent.to_string(),
                format!("expected a {} ID", expected_parent),
            ));
        }
        let child = self.types[self.types.len() - 1];
        let path = format!("{}/{}", parent, child);
        self.arm.list(ctx, &path, self.api_version).await
    }
}

/// `Microsoft.Logic` collections.
#[derive(Debug, Clone)]
pub struct LogicClient {
    pub integration_accounts: ResourceClient,
    pub integration_account_certificates: ResourceClient,
    pub integration_account_sessions: ResourceClient,
    pub integration_service_environments: ResourceClient,
    pub workflows: ResourceClient,
}

impl LogicClient {
    fn new(arm: ArmClient) -> Self {
        let client = |types: &'static [&'static str]| {
            ResourceClient::new(arm.clone(), LOGIC_NAMESPACE, types, LOGIC_API_VERSION)
        };
        Self {
            integration_accounts: client(&["integrationAccounts"]),
            integration_account_certificates: client(&["integrationAccounts", "certificates"]),
            integration_account_sessions: client(&["integrationAccounts", "sessions"]),
            integration_service_environments: client(&["integrationServiceEnvironments"]),
            workflows: client(&["workflows"]),
        }
    }
}
