use thiserror::Error;

use crate::context::Interrupted;

/// Azure Resource Manager errors that can occur while mapping resources.
///
/// SECURITY: Error messages must NEVER contain bearer tokens or client secrets.
#[derive(Debug, Error)]
pub enum AzureError {
    /// The identifier does not match the expected segment template
    #[error("malformed resource ID {id:?}: {reason}")]
    MalformedId { id: String, reason: String },

    /// The resource (or a property it depends on) does not exist
    #[error("{resource} was not found")]
    NotFound { resource: String },

    /// Token acquisition failed or the API rejected the credentials
    #[error("authentication failed: {message}")]
    Auth { message: String },

    /// API returned an error response
    #[error("API error ({status}) {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// An unmanaged resource with the same identifier already exists
    #[error(
        "a resource with the ID {id:?} already exists - to be managed this resource needs to be imported into the state"
    )]
    AlreadyExists { id: String },

    /// Network-level error (connection failed, timeout, etc.)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Throttled by ARM after every retry was used
    #[error("rate limited, retry after {retry_after}s")]
    RateLimited { retry_after: u64 },

    /// A long-running operation reached a failed terminal state
    #[error("operation {status}: {message}")]
    OperationFailed { status: String, message: String },

    #[error("invalid value for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("failed to decode response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("operation cancelled")]
    Cancelled,

    #[error("timed out waiting for {operation}")]
    Timeout { operation: String },
}

impl AzureError {
    pub fn not_found(resource: impl std::fmt::Display) -> Self {
        AzureError::NotFound {
            resource: resource.to_string(),
        }
    }

    pub fn malformed(id: &str, reason: impl Into<String>) -> Self {
        AzureError::MalformedId {
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AzureError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn interrupted(reason: Interrupted, operation: &str) -> Self {
        match reason {
            Interrupted::Cancelled => AzureError::Cancelled,
            Interrupted::DeadlineExceeded => AzureError::Timeout {
                operation: operation.to_string(),
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            AzureError::NotFound { .. } => true,
            AzureError::Api { status, .. } => *status == 404,
            _ => false,
        }
    }
}

impl From<AzureError> for crate::providers::ProviderError {
    fn from(err: AzureError) -> Self {
        use crate::providers::ProviderError;
        match err {
            AzureError::AlreadyExists { id } => ProviderError::RequiresImport(id),
            AzureError::NotFound { resource } => ProviderError::NotFound(resource),
            AzureError::Auth { message } => ProviderError::Auth(message),
            AzureError::MalformedId { .. } | AzureError::Validation { .. } => {
                ProviderError::InvalidConfig(err.to_string())
            }
            other => ProviderError::Azure(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_display() {
        let err = AzureError::Auth {
            message: "AADSTS7000215: Invalid client secret provided".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "authentication failed: AADSTS7000215: Invalid client secret provided"
        );
    }

    #[test]
    fn test_api_error_display() {
        let err = AzureError::Api {
            status: 409,
            code: "Conflict".to_string(),
            message: "Website with given name already exists.".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "API error (409) Conflict: Website with given name already exists."
        );
    }

    #[test]
    fn test_rate_limited_display() {
        let err = AzureError::RateLimited { retry_after: 30 };
        assert_eq!(err.to_string(), "rate limited, retry after 30s");
    }

    #[test]
    fn test_already_exists_mentions_import() {
        let err = AzureError::AlreadyExists {
            id: "/subscriptions/s/resourceGroups/g/providers/Microsoft.Web/sites/a".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("already exists"));
        assert!(msg.contains("imported"));
        assert!(msg.contains("Microsoft.Web/sites/a"));
    }

    #[test]
    fn test_is_not_found() {
        assert!(AzureError::not_found("Linux Web App x").is_not_found());
        assert!(
            AzureError::Api {
                status: 404,
                code: "ResourceNotFound".to_string(),
                message: String::new(),
            }
            .is_not_found()
        );
        assert!(!AzureError::Cancelled.is_not_found());
    }

    #[test]
    fn test_interrupted_mapping() {
        assert!(matches!(
            AzureError::interrupted(Interrupted::Cancelled, "creation"),
            AzureError::Cancelled
        ));
        match AzureError::interrupted(Interrupted::DeadlineExceeded, "creation") {
            AzureError::Timeout { operation } => assert_eq!(operation, "creation"),
            other => panic!("expected Timeout, got {other:?}"),
        }
    }

    #[test]
    fn test_conversion_keeps_requires_import_distinct() {
        let err = AzureError::AlreadyExists { id: "abc".to_string() };
        let provider_err: crate::providers::ProviderError = err.into();
        assert!(matches!(
            provider_err,
            crate::providers::ProviderError::RequiresImport(ref id) if id == "abc"
        ));
    }

    #[test]
    fn test_conversion_to_provider_error() {
        let err = AzureError::OperationFailed {
            status: "Failed".to_string(),
            message: "quota exceeded".to_string(),
        };
        let provider_err: crate::providers::ProviderError = err.into();
        assert!(matches!(
            provider_err,
            crate::providers::ProviderError::Azure(_)
        ));
        assert!(provider_err.to_string().contains("quota exceeded"));
    }
}
