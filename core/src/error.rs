use thiserror::Error;

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Map access token is missing; set map.access_token or LIVEMAP_ACCESS_TOKEN")]
    MissingAccessToken,

    #[error("Invalid config field '{field}': {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ViewerResult<T> = Result<T, ViewerError>;
