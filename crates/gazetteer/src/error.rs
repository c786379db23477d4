//! Error types for the gazetteer.

use thiserror::Error;

/// Result type for gazetteer operations.
pub type GazetteerResult<T> = Result<T, GazetteerError>;

#[derive(Error, Debug)]
pub enum GazetteerError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid city record: {0}")]
    InvalidRecord(String),
}
