use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum RmxError {
    #[error("I/O Error: {0}")]
    Io(#[from] Arc<std::io::Error>),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] Arc<serde_json::Error>),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Catalog Error: {0}")]
    Catalog(String),

    #[error("Resource Not Found: {0}")]
    NotFound(String),

    #[error("Version error: {0}")]
    VersionError(String),

    #[error("Dependent query failed for '{0}': {1}")]
    DependentQuery(String, String),

    #[error("Failed to execute command: {0}")]
    CommandExec(String),

    #[error("Output Error: {0}")]
    Output(String),

    #[error("Generic Error: {0}")]
    Generic(String),
}

impl From<std::io::Error> for RmxError {
    fn from(err: std::io::Error) -> Self {
        RmxError::Io(Arc::new(err))
    }
}

impl From<serde_json::Error> for RmxError {
    fn from(err: serde_json::Error) -> Self {
        RmxError::Json(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, RmxError>;
