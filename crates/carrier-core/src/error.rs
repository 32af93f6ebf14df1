use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CarrierError {
    #[error("applied-set store unavailable: {detail}")]
    StoreUnavailable { detail: String },

    #[error("units directory not found: {0}")]
    UnitsDirNotFound(PathBuf),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, CarrierError>;
