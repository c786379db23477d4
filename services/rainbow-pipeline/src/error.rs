//! Error types for the pipeline service.

use std::path::PathBuf;

use gazetteer::GazetteerError;
use rainbow_analysis::AnalysisError;
use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("Gazetteer error: {0}")]
    Gazetteer(#[from] GazetteerError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Another pipeline run holds {0}")]
    Locked(PathBuf),

    #[error("Analysis task failed: {0}")]
    Task(String),
}

impl PipelineError {
    /// A slug whose raw raster has not arrived yet.
    pub fn is_not_ready(&self) -> bool {
        matches!(self, Self::Analysis(AnalysisError::NotReady(_)))
    }
}

impl From<tokio::task::JoinError> for PipelineError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Task(e.to_string())
    }
}
