pub mod azure;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::context::Context;
use crate::resource::Resource;
use crate::schema::ResourceSchema;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("unsupported resource type: {0}")]
    UnknownResourceType(String),
    #[error(
        "a resource with the ID {0:?} already exists - to be managed via Terraform this resource needs to be imported into the State"
    )]
    RequiresImport(String),
    #[error("{0} was not found")]
    NotFound(String),
    #[error("authentication error: {0}")]
    Auth(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("azure error: {0}")]
    Azure(String),
}

/// JSON-valued CRUD for the resource types a provider manages.
///
/// Values are the resource's configuration model serialized as JSON (snake_case field names).
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;
    fn resource_types(&self) -> Vec<&str>;
    fn schema(&self, resource_type: &str) -> Result<ResourceSchema, ProviderError>;

    /// Fills defaults and canonicalizes user configuration so it compares with read results.
    fn normalize(&self, resource_type: &str, config: &Value) -> Result<Value, ProviderError>;

    /// The remote ID the configuration would have once created.
    fn resource_id(&self, resource_type: &str, config: &Value) -> Result<String, ProviderError>;

    /// `Ok(None)` when the resource no longer exists.
    async fn read(
        &self,
        ctx: &Context,
        resource_type: &str,
        id: &str,
        configured: Option<&Value>,
    ) -> Result<Option<Value>, ProviderError>;

    async fn create(
        &self,
        ctx: &Context,
        resource_type: &str,
        config: &Value,
    ) -> Result<Value, ProviderError>;

    async fn update(
        &self,
        ctx: &Context,
        resource_type: &str,
        id: &str,
        config: &Value,
    ) -> Result<Value, ProviderError>;

    async fn delete(&self, ctx: &Context, resource_type: &str, id: &str)
    -> Result<(), ProviderError>;

    fn generate_import(&self, resource: &Resource) -> String {
        import_block(resource)
    }
}

/// An HCL `import` block adopting `resource` under its address.
pub fn import_block(resource: &Resource) -> String {
    format!(
        "import {{\n  to = {}\n  id = \"{}\"\n}}",
        resource.address(),
        resource.resource_id
    )
}

pub fn get_provider(
    name: &str,
    options: azure::ClientOptions,
) -> Result<Box<dyn Provider>, ProviderError> {
    match name {
        "azurerm" => Ok(Box::new(azure::AzureProvider::new(&options)?)),
        other => Err(ProviderError::UnknownProvider(other.to_string())),
    }
}
