use qdrop_core::models::RecordKey;
use thiserror::Error;

/// Transport-level failures talking to the document store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else {
            StoreError::Request(err.to_string())
        }
    }
}

/// The organization directory could not answer
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Organization directory unavailable: {0}")]
    Unavailable(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Build record {0} not found")]
    RecordNotFound(RecordKey),

    #[error(transparent)]
    Store(#[from] StoreError),
}
