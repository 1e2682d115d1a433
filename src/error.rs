use thiserror::Error;

use crate::terraform::StateError;

#[derive(Debug, Error)]
pub enum AzrmError {
    #[error(transparent)]
    Provider(#[from] crate::providers::ProviderError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("configuration error: {0}")]
    Config(String),
}
