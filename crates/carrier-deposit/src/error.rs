use thiserror::Error;

#[derive(Debug, Error)]
pub enum DepositError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("repository API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    #[error("response missing expected field: {0}")]
    MissingField(&'static str),

    #[error("file has no usable name: {0}")]
    BadFileName(std::path::PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, DepositError>;
