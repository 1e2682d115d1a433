use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, LOCATION, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::AzureError;
use super::auth::{TokenCredential, default_scope};
use super::types::{ArmErrorResponse, ListResponse, OperationStatus};
use crate::context::Context;

const AZURE_ASYNC_OPERATION: &str = "azure-asyncoperation";

const USER_AGENT: &str = concat!("azrm/", env!("CARGO_PKG_VERSION"));

/// Transport tuning. Retries cover throttling and transient gateway failures only.
#[derive(Debug, Clone)]
pub struct TransportOptions {
    pub max_retries: u32,
    pub retry_backoff: Duration,
    pub poll_interval: Duration,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            max_retries: 5,
            retry_backoff: Duration::from_secs(2),
            poll_interval: Duration::from_secs(10),
        }
    }
}

#[derive(Debug)]
struct RawResponse {
    status: StatusCode,
    body: String,
    async_operation: Option<String>,
    location: Option<String>,
    retry_after: Option<Duration>,
}

impl RawResponse {
    fn decode<T: DeserializeOwned>(&self) -> Result<T, AzureError> {
        Ok(serde_json::from_str(&self.body)?)
    }

    fn is_accepted(&self) -> bool {
        self.status == StatusCode::CREATED || self.status == StatusCode::ACCEPTED
    }
}

/// Authenticated client for one ARM-style REST endpoint.
#[derive(Clone)]
pub struct ArmClient {
    client: reqwest::Client,
    credential: Arc<dyn TokenCredential>,
    base_url: String,
    scope: String,
    options: TransportOptions,
}

impl ArmClient {
    pub fn new(base_url: String, credential: Arc<dyn TokenCredential>) -> Result<Self, AzureError> {
        Self::with_options(base_url, credential, TransportOptions::default())
    }

    pub fn with_options(
        base_url: String,
        credential: Arc<dyn TokenCredential>,
        options: TransportOptions,
    ) -> Result<Self, AzureError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(AzureError::Network)?;

        let base_url = base_url.trim_end_matches('/').to_string();
        let scope = default_scope(&base_url);

        Ok(Self {
            client,
            credential,
            base_url,
            scope,
            options,
        })
    }

    /// Overrides the token scope, e.g. when the API audience differs from the base URL.
    pub fn with_scope(mut self, scope: String) -> Self {
        self.scope = scope;
        self
    }

    pub fn api_base(&self) -> &str {
        &self.base_url
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn url(&self, path: &str, api_version: &str, query: &[(&str, &str)]) -> Result<String, AzureError> {
        let mut url = url::Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| AzureError::validation("url", e.to_string()))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("api-version", api_version);
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url.into())
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        path: &str,
        api_version: &str,
    ) -> Result<T, AzureError> {
        self.get_with_query(ctx, path, api_version, &[]).await
    }

    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        path: &str,
        api_version: &str,
        query: &[(&str, &str)],
    ) -> Result<T, AzureError> {
        let url = self.url(path, api_version, query)?;
        let response = self.send(ctx, Method::GET, &url, None, path).await?;
        response.decode()
    }

    /// Follows `nextLink` until the collection is exhausted.
    pub async fn list<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        path: &str,
        api_version: &str,
    ) -> Result<Vec<T>, AzureError> {
        let mut all_results = Vec::new();
        let mut next = Some(self.url(path, api_version, &[])?);

        while let Some(url) = next {
            let response = self.send(ctx, Method::GET, &url, None, path).await?;
            let page: ListResponse<T> = response.decode()?;
            all_results.extend(page.value);
            next = page.next_link.filter(|link| !link.is_empty());
        }

        Ok(all_results)
    }

    /// PUT and wait for the operation to settle, then return the resource as ARM reports it.
    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        ctx: &Context,
        path: &str,
        api_version: &str,
        body: &B,
    ) -> Result<T, AzureError> {
        self.write(ctx, Method::PUT, path, api_version, body).await
    }

    pub async fn patch<B: Serialize, T: DeserializeOwned>(
        &self,
        ctx: &Context,
        path: &str,
        api_version: &str,
        body: &B,
    ) -> Result<T, AzureError> {
        self.write(ctx, Method::PATCH, path, api_version, body).await
    }

    /// POST for action endpoints such as `config/appsettings/list`.
    pub async fn post<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        path: &str,
        api_version: &str,
    ) -> Result<T, AzureError> {
        let url = self.url(path, api_version, &[])?;
        let response = self.send(ctx, Method::POST, &url, None, path).await?;
        response.decode()
    }

    pub async fn delete(
        &self,
        ctx: &Context,
        path: &str,
        api_version: &str,
        query: &[(&str, &str)],
    ) -> Result<(), AzureError> {
        let url = self.url(path, api_version, query)?;
        let response = self.send(ctx, Method::DELETE, &url, None, path).await?;
        if response.is_accepted() {
            self.wait_for_completion(ctx, &response, path).await?;
        }
        Ok(())
    }

    async fn write<B: Serialize, T: DeserializeOwned>(
        &self,
        ctx: &Context,
        method: Method,
        path: &str,
        api_version: &str,
        body: &B,
    ) -> Result<T, AzureError> {
        let url = self.url(path, api_version, &[])?;
        let body = serde_json::to_value(body)?;
        let response = self.send(ctx, method, &url, Some(&body), path).await?;

        if response.is_accepted()
            && (response.async_operation.is_some() || response.location.is_some())
        {
            self.wait_for_completion(ctx, &response, path).await?;
            let settled = self.send(ctx, Method::GET, &url, None, path).await?;
            return settled.decode();
        }

        response.decode()
    }

    async fn wait_for_completion(
        &self,
        ctx: &Context,
        initial: &RawResponse,
        resource: &str,
    ) -> Result<(), AzureError> {
        let (poll_url, via_async_operation) = match (&initial.async_operation, &initial.location) {
            (Some(url), _) => (url.clone(), true),
            (None, Some(url)) => (url.clone(), false),
            (None, None) => return Ok(()),
        };

        let mut delay = initial.retry_after.unwrap_or(self.options.poll_interval);
        let mut polls = 0u32;

        loop {
            ctx.sleep(delay)
                .await
                .map_err(|reason| AzureError::interrupted(reason, resource))?;
            polls += 1;

            let response = self
                .send(ctx, Method::GET, &poll_url, None, resource)
                .await?;
            delay = response.retry_after.unwrap_or(self.options.poll_interval);

            if via_async_operation {
                let status: OperationStatus = response.decode()?;
                tracing::debug!(resource, status = %status.status, polls, "polled long-running operation");
                if !status.is_terminal() {
                    continue;
                }
                if status.is_success() {
                    return Ok(());
                }
                let message = status
                    .error
                    .map(|e| format!("{}: {}", e.code, e.message))
                    .unwrap_or_else(|| "no error details returned".to_string());
                return Err(AzureError::OperationFailed {
                    status: status.status,
                    message,
                });
            }

            tracing::debug!(resource, status = response.status.as_u16(), polls, "polled operation location");
            if response.status != StatusCode::ACCEPTED {
                return Ok(());
            }
        }
    }

    async fn send(
        &self,
        ctx: &Context,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
        resource: &str,
    ) -> Result<RawResponse, AzureError> {
        let mut attempt = 0u32;
        let mut backoff = self.options.retry_backoff;

        loop {
            let token = ctx
                .run(self.credential.get_token(&self.scope))
                .await
                .map_err(|reason| AzureError::interrupted(reason, resource))??;

            let mut request = self.client.request(method.clone(), url).bearer_auth(token);
            if let Some(body) = body {
                request = request.json(body);
            }

            tracing::debug!(%method, resource, attempt, "sending ARM request");

            let response = ctx
                .run(request.send())
                .await
                .map_err(|reason| AzureError::interrupted(reason, resource))??;

            let status = response.status();
            let headers = response.headers().clone();
            let body_text = ctx
                .run(response.text())
                .await
                .map_err(|reason| AzureError::interrupted(reason, resource))??;

            let retry_after = parse_retry_after(&headers);

            if is_retryable(status) {
                if attempt >= self.options.max_retries {
                    if status == StatusCode::TOO_MANY_REQUESTS {
                        return Err(AzureError::RateLimited {
                            retry_after: retry_after.map(|d| d.as_secs()).unwrap_or(0),
                        });
                    }
                    return Err(api_error(status, &body_text));
                }
                attempt += 1;
                let delay = retry_after.unwrap_or(backoff);
                tracing::warn!(
                    status = status.as_u16(),
                    attempt,
                    max_retries = self.options.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    resource,
                    "transient ARM response, retrying"
                );
                ctx.sleep(delay)
                    .await
                    .map_err(|reason| AzureError::interrupted(reason, resource))?;
                backoff *= 2;
                continue;
            }

            if status == StatusCode::NOT_FOUND {
                return Err(AzureError::not_found(resource));
            }

            if status == StatusCode::UNAUTHORIZED {
                let message = serde_json::from_str::<ArmErrorResponse>(&body_text)
                    .map(|e| e.error.message)
                    .unwrap_or_else(|_| "the access token was rejected".to_string());
                self.credential.invalidate().await;
                return Err(AzureError::Auth { message });
            }

            if !status.is_success() {
                return Err(api_error(status, &body_text));
            }

            return Ok(RawResponse {
                status,
                body: body_text,
                async_operation: header_string(&headers, AZURE_ASYNC_OPERATION),
                location: header_string(&headers, LOCATION.as_str()),
                retry_after,
            });
        }
    }
}

fn is_retryable(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

fn api_error(status: StatusCode, body: &str) -> AzureError {
    match serde_json::from_str::<ArmErrorResponse>(body) {
        Ok(envelope) => AzureError::Api {
            status: status.as_u16(),
            code: envelope.error.code,
            message: envelope.error.message,
        },
        Err(_) => AzureError::Api {
            status: status.as_u16(),
            code: status.canonical_reason().unwrap_or("Unknown").to_string(),
            message: body.chars().take(200).collect(),
        },
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

impl std::fmt::Debug for ArmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArmClient")
            .field("base_url", &self.base_url)
            .field("credential", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::azure::auth::StaticTokenCredential;

    fn client() -> ArmClient {
        ArmClient::new(
            "https://management.azure.com/".to_string(),
            Arc::new(StaticTokenCredential::new("super_secret_token_12345")),
        )
        .unwrap()
    }

    #[test]
    fn test_client_creation_trims_base() {
        let client = client();
        assert_eq!(client.api_base(), "https://management.azure.com");
        assert_eq!(client.scope(), "https://management.azure.com/.default");
    }

    #[test]
    fn test_url_appends_api_version_and_query() {
        let url = client()
            .url(
                "/subscriptions/s/resourceGroups/g/providers/Microsoft.Web/sites/a",
                "2021-02-01",
                &[("deleteEmptyServerFarm", "false")],
            )
            .unwrap();
        assert_eq!(
            url,
            "https://management.azure.com/subscriptions/s/resourceGroups/g/providers/Microsoft.Web/sites/a?api-version=2021-02-01&deleteEmptyServerFarm=false"
        );
    }

    #[test]
    fn test_debug_does_not_expose_token() {
        let debug_output = format!("{:?}", client());
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_token_12345"));
    }

    #[test]
    fn test_client_is_clone() {
        let _cloned = client().clone();
    }

    #[test]
    fn test_api_error_decodes_arm_envelope() {
        let err = api_error(
            StatusCode::CONFLICT,
            r#"{"error":{"code":"Conflict","message":"already exists"}}"#,
        );
        match err {
            AzureError::Api {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 409);
                assert_eq!(code, "Conflict");
                assert_eq!(message, "already exists");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_api_error_falls_back_to_reason() {
        let err = api_error(StatusCode::BAD_REQUEST, "<html>nope</html>");
        assert_eq!(err.to_string(), "API error (400) Bad Request: <html>nope</html>");
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_retryable(StatusCode::CONFLICT));
        assert!(!is_retryable(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_parse_retry_after_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, "7".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(7)));

        headers.insert(RETRY_AFTER, "Wed, 21 Oct 2015 07:28:00 GMT".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), None);
    }
}
