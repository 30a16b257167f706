use std::path::PathBuf;

use pagediff_types::FileKind;

/// Errors from extraction collaborators.
///
/// A side that merely cannot be read is not an error: it is returned as an
/// unavailable [`SideContent`](pagediff_types::SideContent). These variants
/// cover inputs the collaborator cannot handle at all.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// No file-based reader exists for this kind of input.
    #[error("{kind} files are not supported: {reason}")]
    Unsupported { kind: FileKind, reason: String },

    /// A workbook dump could not be decoded.
    #[error("invalid workbook {path}: {reason}")]
    InvalidWorkbook { path: PathBuf, reason: String },

    /// A merged range lies outside its sheet or is inverted.
    #[error("sheet {sheet}: invalid merged range {range}")]
    InvalidMergedRange { sheet: String, range: String },
}

/// Result alias for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;
