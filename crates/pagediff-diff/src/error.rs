//! Error types for the diff crate.

/// Errors that can occur while diffing a unit.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// The differ rejected or could not process the unit.
    #[error("unit {index}: {reason}")]
    Unit { index: u32, reason: String },

    /// The differ panicked while processing the unit.
    #[error("unit {index}: differ panicked: {message}")]
    Panicked { index: u32, message: String },

    /// The differ returned a result tagged with a different unit index.
    #[error("unit {expected}: differ returned result for unit {actual}")]
    IndexMismatch { expected: u32, actual: u32 },
}

impl DiffError {
    /// Index of the unit the error belongs to.
    pub fn index(&self) -> u32 {
        match self {
            DiffError::Unit { index, .. } | DiffError::Panicked { index, .. } => *index,
            DiffError::IndexMismatch { expected, .. } => *expected,
        }
    }
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
