use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown file kind: {0} (expected pdf, excel, or text)")]
    UnknownFileKind(String),

    #[error("slice {start}..{end} out of bounds for sequence of {len} lines")]
    SliceOutOfBounds { start: usize, end: usize, len: usize },
}
