//! Plain text sides.

use std::path::Path;

use tracing::{debug, warn};

use pagediff_types::{LineSequence, SideContent};

/// Display name for a side: the file name, or the whole path if it has none.
pub fn side_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Read raw bytes for a side, logging and describing the failure.
pub(crate) fn read_bytes(path: &Path) -> Result<Vec<u8>, String> {
    std::fs::read(path).map_err(|e| {
        warn!(path = %path.display(), error = %e, "could not read side, treating it as empty");
        e.to_string()
    })
}

/// Read a text file as one unpaginated side.
///
/// Invalid UTF-8 is replaced rather than rejected. A missing or unreadable
/// file yields an unavailable, empty side.
pub fn read_text_side(path: &Path) -> SideContent {
    let name = side_name(path);
    match read_bytes(path) {
        Ok(bytes) => {
            let lines = LineSequence::from_text(&String::from_utf8_lossy(&bytes));
            debug!(path = %path.display(), lines = lines.len(), "read text side");
            SideContent::from_lines(name, lines).with_size(bytes.len() as u64)
        }
        Err(reason) => SideContent::unavailable(name, reason),
    }
}
