use thiserror::Error;

/// Failures talking to the local storage directory.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error on {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("serialization error on {key}: {source}")]
    Serde {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }
}
