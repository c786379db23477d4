//! Error types shared by the rainbow forecast crates.

use thiserror::Error;

/// Result type alias using CommonError.
pub type CommonResult<T> = Result<T, CommonError>;

/// Errors raised while building or parsing the shared domain types.
#[derive(Debug, Error)]
pub enum CommonError {
    #[error("Invalid forecast slug '{0}': expected YYYYMMDDHH")]
    InvalidSlug(String),

    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("Raster size mismatch: expected {expected} values, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("Invalid quantized key '{0}': expected XxY")]
    InvalidKey(String),
}

impl CommonError {
    /// Create a SizeMismatch error.
    pub fn size_mismatch(expected: usize, actual: usize) -> Self {
        Self::SizeMismatch { expected, actual }
    }
}

impl From<serde_json::Error> for CommonError {
    fn from(err: serde_json::Error) -> Self {
        CommonError::InvalidGrid(format!("JSON error: {}", err))
    }
}
