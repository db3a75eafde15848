use thiserror::Error;

#[derive(Error, Debug)]
pub enum RedZoneError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

pub type Result<T> = std::result::Result<T, RedZoneError>;
