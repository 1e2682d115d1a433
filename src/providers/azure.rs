mod auth;
mod client;
mod clients;
mod error;
mod id;
pub mod linux_web_app;
mod types;

pub use auth::{
    ClientSecretCredential, CloudEnvironment, StaticTokenCredential, TokenCredential,
    default_scope,
};
pub use client::{ArmClient, TransportOptions};
pub use clients::{
    AppConfigurationClient, AppServiceClient, ClientBundle, ClientOptions, DataPlaneClient,
    KeyValue, LogicClient, ResourceClient,
};
pub use error::AzureError;
pub use id::{
    ConfigurationStoreId, ResourceGroupId, ResourceId, ServicePlanId, WebAppId, WorkflowId,
};
pub use linux_web_app::{LinuxWebAppModel, LinuxWebAppResource};
pub use types::{ConfigurationStore, GenericResource};

use async_trait::async_trait;
use serde_json::Value;

use super::{Provider, ProviderError};
use crate::context::Context;
use crate::schema::ResourceSchema;

pub struct AzureProvider {
    clients: ClientBundle,
    linux_web_app: LinuxWebAppResource,
}

impl AzureProvider {
    pub fn new(options: &ClientOptions) -> Result<Self, AzureError> {
        let clients = ClientBundle::new(options)?;
        let linux_web_app = LinuxWebAppResource::new(&clients);
        Ok(Self {
            clients,
            linux_web_app,
        })
    }

    pub fn clients(&self) -> &ClientBundle {
        &self.clients
    }

    fn check_type(&self, resource_type: &str) -> Result<(), ProviderError> {
        if resource_type == linux_web_app::RESOURCE_TYPE {
            Ok(())
        } else {
            Err(ProviderError::UnknownResourceType(resource_type.to_string()))
        }
    }
}

fn parse_model(config: &Value) -> Result<LinuxWebAppModel, ProviderError> {
    let mut model: LinuxWebAppModel = serde_json::from_value(config.clone())
        .map_err(|e| ProviderError::InvalidConfig(e.to_string()))?;
    model.location = linux_web_app::normalize_location(&model.location);
    if let Some(trigger) = model
        .site_config
        .as_mut()
        .and_then(|c| c.auto_heal_setting.as_mut())
        .and_then(|s| s.trigger.as_mut())
    {
        trigger.sort_status_codes();
    }
    Ok(model)
}

fn to_state(model: &LinuxWebAppModel) -> Result<Value, ProviderError> {
    Ok(serde_json::to_value(model).map_err(AzureError::from)?)
}

#[async_trait]
impl Provider for AzureProvider {
    fn name(&self) -> &str {
        "azurerm"
    }

    fn resource_types(&self) -> Vec<&str> {
        vec![linux_web_app::RESOURCE_TYPE]
    }

    fn schema(&self, resource_type: &str) -> Result<ResourceSchema, ProviderError> {
        self.check_type(resource_type)?;
        Ok(linux_web_app::schema())
    }

    fn normalize(&self, resource_type: &str, config: &Value) -> Result<Value, ProviderError> {
        self.check_type(resource_type)?;
        to_state(&parse_model(config)?)
    }

    fn resource_id(&self, resource_type: &str, config: &Value) -> Result<String, ProviderError> {
        self.check_type(resource_type)?;
        let model = parse_model(config)?;
        Ok(self.linux_web_app.id_for(&model)?.to_string())
    }

    async fn read(
        &self,
        ctx: &Context,
        resource_type: &str,
        id: &str,
        configured: Option<&Value>,
    ) -> Result<Option<Value>, ProviderError> {
        self.check_type(resource_type)?;
        let id = WebAppId::parse(id)?;
        let configured = configured.map(parse_model).transpose()?;

        match self.linux_web_app.read(ctx, &id, configured.as_ref()).await? {
            Some(model) => Ok(Some(to_state(&model)?)),
            None => Ok(None),
        }
    }

    async fn create(
        &self,
        ctx: &Context,
        resource_type: &str,
        config: &Value,
    ) -> Result<Value, ProviderError> {
        self.check_type(resource_type)?;
        let model = parse_model(config)?;
        let created = self.linux_web_app.create(ctx, &model).await?;
        to_state(&created)
    }

    async fn update(
        &self,
        ctx: &Context,
        resource_type: &str,
        id: &str,
        config: &Value,
    ) -> Result<Value, ProviderError> {
        self.check_type(resource_type)?;
        let id = WebAppId::parse(id)?;
        let model = parse_model(config)?;
        let updated = self.linux_web_app.update(ctx, &id, &model).await?;
        to_state(&updated)
    }

    async fn delete(
        &self,
        ctx: &Context,
        resource_type: &str,
        id: &str,
    ) -> Result<(), ProviderError> {
        self.check_type(resource_type)?;
        let id = WebAppId::parse(id)?;
        Ok(self.linux_web_app.delete(ctx, &id).await?)
    }
}
