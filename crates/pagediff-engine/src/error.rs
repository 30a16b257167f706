use std::path::PathBuf;

use pagediff_extract::ExtractError;

/// Errors that abort a whole comparison.
///
/// Failures confined to one unit are not errors; they are reported as
/// [`UnitFailure`](pagediff_types::UnitFailure)s next to the result.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration file could not be read.
    #[error("cannot read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Neither side of the document could be extracted.
    #[error("neither side could be extracted (dev: {dev}; prod: {prod})")]
    BothSidesEmpty { dev: String, prod: String },

    /// The run was cancelled before every unit was submitted.
    #[error("comparison cancelled after {completed} of {total} units")]
    Cancelled { completed: u32, total: u32 },

    /// The extraction collaborator rejected the input.
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    /// A blocking task panicked or was aborted.
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl EngineError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
