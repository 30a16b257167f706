//! Extraction collaborators for pagediff.
//!
//! Turns source files into the two [`SideContent`]s of a [`DocumentPair`].
//! There is exactly one extraction path per [`FileKind`]; nothing downstream
//! of this crate looks at the kind again.
//!
//! A side that cannot be read becomes an unavailable, empty side and the
//! comparison proceeds. Only inputs this crate cannot handle at all are
//! reported as [`ExtractError`]s.

pub mod error;
pub mod excel;
pub mod pdf;
pub mod text;

use std::path::Path;

use tracing::info;

use pagediff_types::{DocumentPair, FileKind, SideContent};

pub use error::{ExtractError, ExtractResult};
pub use excel::{row_cells, sides_from_workbooks, CellRange, Sheet, Workbook};
pub use pdf::{pdf_side_from_text, read_pdf_text_side, split_pages, PAGE_BREAK};
pub use text::{read_text_side, side_name};

use excel::{load_workbook, LoadedWorkbook};

/// Extract both sides of a comparison from files.
pub fn extract_pair(kind: FileKind, dev: &Path, prod: &Path) -> ExtractResult<DocumentPair> {
    let pair = match kind {
        FileKind::Text => DocumentPair::new(kind, read_text_side(dev), read_text_side(prod)),
        FileKind::Pdf => DocumentPair::new(kind, read_pdf_text_side(dev), read_pdf_text_side(prod)),
        FileKind::Excel => extract_workbooks(dev, prod)?,
    };
    info!(
        kind = %kind,
        dev = %pair.dev.name,
        prod = %pair.prod.name,
        dev_lines = pair.dev.lines.len(),
        prod_lines = pair.prod.lines.len(),
        "extracted document pair"
    );
    Ok(pair)
}

fn extract_workbooks(dev: &Path, prod: &Path) -> ExtractResult<DocumentPair> {
    let dev_loaded = load_workbook(dev)?;
    let prod_loaded = load_workbook(prod)?;

    let empty = Workbook::default();
    let (dev_book, dev_size) = book_or_empty(&dev_loaded, &empty);
    let (prod_book, prod_size) = book_or_empty(&prod_loaded, &empty);

    let (dev_side, prod_side) =
        sides_from_workbooks(side_name(dev), dev_book, side_name(prod), prod_book)?;
    Ok(DocumentPair::new(
        FileKind::Excel,
        mark_unavailable(dev_side.with_size(dev_size), &dev_loaded),
        mark_unavailable(prod_side.with_size(prod_size), &prod_loaded),
    ))
}

fn book_or_empty<'a>(loaded: &'a LoadedWorkbook, empty: &'a Workbook) -> (&'a Workbook, u64) {
    match loaded {
        LoadedWorkbook::Loaded { book, size } => (book, *size),
        LoadedWorkbook::Unavailable(_) => (empty, 0),
    }
}

fn mark_unavailable(side: SideContent, loaded: &LoadedWorkbook) -> SideContent {
    match loaded {
        LoadedWorkbook::Loaded { .. } => side,
        LoadedWorkbook::Unavailable(reason) => SideContent {
            status: pagediff_types::SideStatus::Unavailable {
                reason: reason.clone(),
            },
            ..side
        },
    }
}
