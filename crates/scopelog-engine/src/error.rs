use thiserror::Error;

/// Errors raised while reading or writing persisted filter state
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to access storage file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Stored filter state under '{key}' is not valid JSON: {source}")]
    Parse {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Stored filter state under '{key}' is not a JSON object")]
    NotAnObject { key: String },

    #[error("Failed to serialize filter state: {0}")]
    Serialize(#[source] serde_json::Error),
}
