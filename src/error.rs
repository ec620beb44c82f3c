//! Error taxonomy shared by every pipeline stage.
//!
//! Stage internals work with `anyhow::Result` and attach context as they go.
//! At a stage boundary the error is tagged with the [`Stage`] that produced it,
//! so the caller always learns which step failed and why.

use std::fmt;

use thiserror::Error;

/// Pipeline step that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Config,
    Ingestion,
    Validation,
    Transformation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Config => write!(f, "configuration"),
            Stage::Ingestion => write!(f, "data ingestion"),
            Stage::Validation => write!(f, "data validation"),
            Stage::Transformation => write!(f, "data transformation"),
        }
    }
}

/// Error returned by every stage entry point.
#[derive(Debug, Error)]
#[error("{stage} stage failed: {source:#}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: anyhow::Error,
}

impl PipelineError {
    pub fn new(stage: Stage, source: impl Into<anyhow::Error>) -> Self {
        Self {
            stage,
            source: source.into(),
        }
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

/// Tags an `anyhow` result with the stage it came from.
pub trait StageContext<T> {
    fn stage(self, stage: Stage) -> Result<T>;
}

impl<T> StageContext<T> for anyhow::Result<T> {
    fn stage(self, stage: Stage) -> Result<T> {
        self.map_err(|source| PipelineError { stage, source })
    }
}
