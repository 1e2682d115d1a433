//! Azure AD token acquisition.
//!
//! Tokens are cached per scope until shortly before expiry. Only tokens are cached here;
//! resource state never is.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::RwLock;

use super::AzureError;

/// Refresh tokens this long before they actually expire.
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CloudEnvironment {
    #[default]
    Public,
    UsGovernment,
    China,
}

impl CloudEnvironment {
    pub fn login_endpoint(&self) -> &'static str {
        match self {
            CloudEnvironment::Public => "https://login.microsoftonline.com",
            CloudEnvironment::UsGovernment => "https://login.microsoftonline.us",
            CloudEnvironment::China => "https://login.chinacloudapi.cn",
        }
    }

    pub fn resource_manager_endpoint(&self) -> &'static str {
        match self {
            CloudEnvironment::Public => "https://management.azure.com",
            CloudEnvironment::UsGovernment => "https://management.usgovcloudapi.net",
            CloudEnvironment::China => "https://management.chinacloudapi.cn",
        }
    }
}

impl std::str::FromStr for CloudEnvironment {
    type Err = AzureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "public" | "azurecloud" => Ok(CloudEnvironment::Public),
            "usgovernment" | "azureusgovernmentcloud" => Ok(CloudEnvironment::UsGovernment),
            "china" | "azurechinacloud" => Ok(CloudEnvironment::China),
            other => Err(AzureError::validation(
                "environment",
                format!("unknown cloud environment {other:?}"),
            )),
        }
    }
}

/// `.default` scope for a resource endpoint, e.g. `https://management.azure.com/.default`.
pub fn default_scope(endpoint: &str) -> String {
    format!("{}/.default", endpoint.trim_end_matches('/'))
}

#[async_trait]
pub trait TokenCredential: Send + Sync {
    async fn get_token(&self, scope: &str) -> Result<String, AzureError>;

    /// Drops cached tokens after the server rejected one.
    async fn invalidate(&self) {}
}

/// A bearer token acquired out of band (e.g. `az account get-access-token`).
pub struct StaticTokenCredential {
    token: SecretString,
}

impl StaticTokenCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::from(token.into()),
        }
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn get_token(&self, _scope: &str) -> Result<String, AzureError> {
        Ok(self.token.expose_secret().to_string())
    }
}

impl std::fmt::Debug for StaticTokenCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenCredential")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Service principal authenticated with a client secret (OAuth2 client credentials flow).
#[derive(Clone)]
pub struct ClientSecretCredential {
    tenant_id: String,
    client_id: String,
    client_secret: SecretString,
    login_endpoint: String,
    http: reqwest::Client,
    cache: Arc<RwLock<HashMap<String, CachedToken>>>,
}

impl ClientSecretCredential {
    pub fn new(
        environment: CloudEnvironment,
        tenant_id: String,
        client_id: String,
        client_secret: SecretString,
    ) -> Self {
        Self::with_login_endpoint(
            environment.login_endpoint().to_string(),
            tenant_id,
            client_id,
            client_secret,
        )
    }

    /// NOTE: Primarily used for testing with mock servers.
    pub fn with_login_endpoint(
        login_endpoint: String,
        tenant_id: String,
        client_id: String,
        client_secret: SecretString,
    ) -> Self {
        Self {
            tenant_id,
            client_id,
            client_secret,
            login_endpoint,
            http: reqwest::Client::new(),
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn acquire(&self, scope: &str) -> Result<CachedToken, AzureError> {
        let url = format!(
            "{}/{}/oauth2/v2.0/token",
            self.login_endpoint.trim_end_matches('/'),
            self.tenant_id
        );

        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
            ("scope", scope),
        ];

        let response = self
            .http
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AzureError::Auth {
                message: format!("token request failed: {}", e.without_url()),
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let message = serde_json::from_str::<TokenErrorResponse>(&body)
                .map(|e| match e.error_description {
                    Some(description) => format!("{}: {}", e.error, description),
                    None => e.error,
                })
                .unwrap_or_else(|_| format!("token endpoint returned {}", status.as_u16()));
            return Err(AzureError::Auth { message });
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| AzureError::Auth {
            message: format!("failed to parse token response: {}", e),
        })?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_BUFFER);

        tracing::debug!(
            scope,
            expires_in = token.expires_in,
            "acquired new access token"
        );

        Ok(CachedToken {
            token: token.access_token,
            expires_at: Instant::now() + lifetime,
        })
    }

}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    async fn get_token(&self, scope: &str) -> Result<String, AzureError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(scope) {
                if cached.is_valid() {
                    return Ok(cached.token.clone());
                }
                tracing::debug!(scope, "cached token expired, fetching new token");
            }
        }

        let fresh = self.acquire(scope).await?;
        let token = fresh.token.clone();
        self.cache.write().await.insert(scope.to_string(), fresh);
        Ok(token)
    }

    async fn invalidate(&self) {
        tracing::debug!("discarding cached access tokens");
        self.cache.write().await.clear();
    }
}

impl std::fmt::Debug for ClientSecretCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSecretCredential")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}
