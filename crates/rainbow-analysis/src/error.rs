//! Error types for forecast analysis.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for analysis operations.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Errors raised while turning a raw moisture raster into a rainbow mask.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The raw raster for the slug has not arrived yet
    #[error("Forecast not ready: {} is missing", .0.display())]
    NotReady(PathBuf),

    /// An external helper is missing, exited non-zero, or cannot do the job
    #[error("External tool '{tool}' failed: {message}")]
    ExternalTool { tool: String, message: String },

    /// An intermediate artifact is malformed or inconsistent
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    pub fn external_tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalTool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Whether the error should abort the current run.
    ///
    /// Only `NotReady` is recoverable; the slug is simply retried later.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::NotReady(_))
    }
}

impl From<rainbow_common::CommonError> for AnalysisError {
    fn from(err: rainbow_common::CommonError) -> Self {
        Self::DataIntegrity(err.to_string())
    }
}

impl From<renderer::RenderError> for AnalysisError {
    fn from(err: renderer::RenderError) -> Self {
        match err {
            renderer::RenderError::Io(e) => Self::Io(e),
            other => Self::DataIntegrity(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        Self::DataIntegrity(format!("malformed grib2json output: {}", err))
    }
}
