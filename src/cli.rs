mod args;

pub use args::*;

use std::sync::Arc;

use azrm::providers::azure::{
    ClientSecretCredential, CloudEnvironment, StaticTokenCredential, TokenCredential,
};
use azrm::{AzrmError, ClientOptions, ProviderError};
use secrecy::SecretString;

impl AzureArgs {
    pub fn cloud_environment(&self) -> Result<CloudEnvironment, AzrmError> {
        self.environment
            .parse::<CloudEnvironment>()
            .map_err(|e| AzrmError::Provider(ProviderError::from(e)))
    }

    fn credential(&self, environment: CloudEnvironment) -> Result<Arc<dyn TokenCredential>, AzrmError> {
        if let Some(token) = &self.access_token {
            tracing::debug!("using pre-acquired access token");
            return Ok(Arc::new(StaticTokenCredential::new(token.clone())));
        }

        match (&self.tenant_id, &self.client_id, &self.client_secret) {
            (Some(tenant_id), Some(client_id), Some(client_secret)) => {
                tracing::debug!(%tenant_id, %client_id, "using client secret credential");
                Ok(Arc::new(ClientSecretCredential::new(
                    environment,
                    tenant_id.clone(),
                    client_id.clone(),
                    SecretString::from(client_secret.clone()),
                )))
            }
            _ => Err(AzrmError::Config(
                "set ARM_ACCESS_TOKEN, or ARM_TENANT_ID, ARM_CLIENT_ID and ARM_CLIENT_SECRET"
                    .to_string(),
            )),
        }
    }

    pub fn client_options(&self) -> Result<ClientOptions, AzrmError> {
        let subscription_id = self
            .subscription_id
            .clone()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AzrmError::Config("ARM_SUBSCRIPTION_ID is not set".to_string()))?;
        let environment = self.cloud_environment()?;
        let credential = self.credential(environment)?;

        let options = ClientOptions::new(subscription_id, environment, credential);
        Ok(match &self.endpoint {
            Some(endpoint) => options.with_endpoint(endpoint.clone()),
            None => options,
        })
    }
}
