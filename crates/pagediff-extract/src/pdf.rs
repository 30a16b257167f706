//! Page-oriented text sides.
//!
//! PDF text is expected to be extracted already, one page after another with
//! a form feed between pages (the layout `pdftotext` writes). Raw PDF bytes
//! are recognised and reported as unavailable rather than diffed as noise.

use std::path::Path;

use tracing::{debug, warn};

use pagediff_types::{LineSequence, SideContent};

use crate::text::{read_bytes, side_name};

/// Separator between pages.
pub const PAGE_BREAK: char = '\x0c';

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Split extracted text into pages.
///
/// A trailing page break does not open a new page. Pages holding only
/// whitespace become empty pages.
pub fn split_pages(text: &str) -> Vec<LineSequence> {
    if text.is_empty() {
        return Vec::new();
    }
    let body = text.strip_suffix(PAGE_BREAK).unwrap_or(text);
    body.split(PAGE_BREAK)
        .map(|page| {
            if page.trim().is_empty() {
                LineSequence::empty()
            } else {
                LineSequence::from_text(page)
            }
        })
        .collect()
}

/// Build a paginated side from already extracted text.
pub fn pdf_side_from_text(name: impl Into<String>, text: &str) -> SideContent {
    SideContent::from_pages(name, split_pages(text)).with_size(text.len() as u64)
}

/// Read a side from a file of form-feed separated page text.
pub fn read_pdf_text_side(path: &Path) -> SideContent {
    let name = side_name(path);
    let bytes = match read_bytes(path) {
        Ok(bytes) => bytes,
        Err(reason) => return SideContent::unavailable(name, reason),
    };
    if bytes.starts_with(PDF_MAGIC) {
        warn!(path = %path.display(), "raw PDF given, expected extracted page text");
        return SideContent::unavailable(name, "raw PDF bytes; extract the page text first")
            .with_size(bytes.len() as u64);
    }
    let pages = split_pages(&String::from_utf8_lossy(&bytes));
    debug!(path = %path.display(), pages = pages.len(), "read paginated side");
    SideContent::from_pages(name, pages).with_size(bytes.len() as u64)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn splits_on_form_feed() {
        let pages = split_pages("p1 a\np1 b\x0cp2\x0c");
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].as_slice(), ["p1 a", "p1 b"]);
        assert_eq!(pages[1].as_slice(), ["p2"]);
    }

    #[test]
    fn blank_pages_are_kept_empty() {
        let pages = split_pages("one\x0c \n \x0cthree");
        assert_eq!(pages.len(), 3);
        assert!(pages[1].is_empty());
        assert_eq!(pages[2].as_slice(), ["three"]);
    }

    #[test]
    fn empty_text_has_no_pages() {
        let side = pdf_side_from_text("empty.pdf", "");
        assert_eq!(side.page_count(), Some(0));
        assert!(side.lines.is_empty());
    }

    #[test]
    fn raw_pdf_is_unavailable() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"%PDF-1.7\n%binary").unwrap();
        let side = read_pdf_text_side(file.path());
        assert!(!side.is_available());
        assert_eq!(side.size_bytes, 16);
    }

    #[test]
    fn reads_page_text_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "first\x0csecond\nline").unwrap();
        let side = read_pdf_text_side(file.path());
        assert_eq!(side.page_count(), Some(2));
        assert_eq!(side.lines.len(), 3);
    }
}
