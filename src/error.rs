// Pixelfleet Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FleetError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Legacy store error: {0}")]
    LegacySource(String),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for FleetError {
    fn from(err: anyhow::Error) -> Self {
        FleetError::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FleetError>;
