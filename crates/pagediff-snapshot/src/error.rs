use std::path::PathBuf;

/// Errors from snapshot storage.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error from the underlying storage.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The snapshot directory does not exist.
    #[error("snapshot directory not found: {0}")]
    MissingDirectory(PathBuf),

    /// An internal lock was poisoned.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

impl SnapshotError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for snapshot operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;
