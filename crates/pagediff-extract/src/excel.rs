//! Spreadsheet sides.
//!
//! Workbooks arrive from a reader collaborator as plain data: sheets of
//! optional cell strings plus their merged ranges. Each sheet becomes one
//! natural page of tab-joined rows. Sheets are aligned across the two sides
//! by name, so a sheet missing on one side compares against an empty page.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use pagediff_types::{LineSequence, SideContent};

use crate::error::{ExtractError, ExtractResult};
use crate::text::{read_bytes, side_name};

/// An inclusive, zero-based rectangle of merged cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRange {
    pub first_row: usize,
    pub first_col: usize,
    pub last_row: usize,
    pub last_col: usize,
}

impl std::fmt::Display for CellRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({},{})..=({},{})",
            self.first_row, self.first_col, self.last_row, self.last_col
        )
    }
}

/// One worksheet.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    /// Rows of cells; `None` is an empty cell. Rows may be ragged.
    pub rows: Vec<Vec<Option<String>>>,
    #[serde(default)]
    pub merged: Vec<CellRange>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self {
            name: name.into(),
            rows,
            merged: Vec::new(),
        }
    }

    pub fn with_merged(mut self, range: CellRange) -> Self {
        self.merged.push(range);
        self
    }

    /// Rows with every merged cell holding its range's top-left value.
    pub fn resolved_rows(&self) -> ExtractResult<Vec<Vec<Option<String>>>> {
        let mut rows = self.rows.clone();
        for range in &self.merged {
            if range.first_row > range.last_row || range.first_col > range.last_col {
                return Err(ExtractError::InvalidMergedRange {
                    sheet: self.name.clone(),
                    range: range.to_string(),
                });
            }
            let value = rows
                .get(range.first_row)
                .and_then(|row| row.get(range.first_col))
                .cloned()
                .flatten();
            if rows.len() <= range.last_row {
                rows.resize(range.last_row + 1, Vec::new());
            }
            for row in &mut rows[range.first_row..=range.last_row] {
                if row.len() <= range.last_col {
                    row.resize(range.last_col + 1, None);
                }
                for cell in &mut row[range.first_col..=range.last_col] {
                    cell.clone_from(&value);
                }
            }
        }
        Ok(rows)
    }

    /// The sheet as text lines: cells joined by tabs, trailing tabs
    /// stripped, blank rows dropped.
    pub fn lines(&self) -> ExtractResult<LineSequence> {
        Ok(self
            .resolved_rows()?
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.as_deref().unwrap_or(""))
                    .collect::<Vec<_>>()
                    .join("\t")
                    .trim_end_matches('\t')
                    .to_string()
            })
            .filter(|line| !line.trim().is_empty())
            .collect())
    }
}

/// A workbook as delivered by a reader collaborator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|s| s.name.as_str())
    }

    /// Decode a workbook dumped as JSON.
    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

/// Pages for `book`, one per name in `names` (empty where the sheet is
/// missing).
fn pages_for(book: &Workbook, names: &BTreeSet<&str>) -> ExtractResult<Vec<LineSequence>> {
    names
        .iter()
        .map(|name| match book.sheet(name) {
            Some(sheet) => sheet.lines(),
            None => Ok(LineSequence::empty()),
        })
        .collect()
}

/// Cells in one flattened row: tabs + 1.
pub fn row_cells(row: &str) -> u64 {
    row.matches('\t').count() as u64 + 1
}

fn workbook_side(
    name: String,
    book: &Workbook,
    names: &BTreeSet<&str>,
) -> ExtractResult<SideContent> {
    let pages = pages_for(book, names)?;
    let cells = pages
        .iter()
        .flat_map(|page| page.iter())
        .map(|row| row_cells(row))
        .sum();
    let declared = book.sheet_names().collect::<BTreeSet<_>>().len();
    Ok(SideContent::from_pages(name, pages)
        .with_declared_pages(declared)
        .with_cells(cells))
}

/// Build both sides from two workbooks, aligning sheets by the sorted union
/// of their names. Each side still reports its own sheet count.
pub fn sides_from_workbooks(
    dev_name: impl Into<String>,
    dev: &Workbook,
    prod_name: impl Into<String>,
    prod: &Workbook,
) -> ExtractResult<(SideContent, SideContent)> {
    let names: BTreeSet<&str> = dev.sheet_names().chain(prod.sheet_names()).collect();
    debug!(sheets = names.len(), "aligning workbook sheets");
    Ok((
        workbook_side(dev_name.into(), dev, &names)?,
        workbook_side(prod_name.into(), prod, &names)?,
    ))
}

/// Outcome of loading one workbook from disk.
pub(crate) enum LoadedWorkbook {
    Loaded { book: Workbook, size: u64 },
    Unavailable(String),
}

/// Load a workbook dump. Native spreadsheet formats need a reader
/// collaborator and are rejected.
pub(crate) fn load_workbook(path: &Path) -> ExtractResult<LoadedWorkbook> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if !is_json {
        return Err(ExtractError::Unsupported {
            kind: pagediff_types::FileKind::Excel,
            reason: format!(
                "{} needs a workbook reader; pass a JSON workbook dump instead",
                side_name(path)
            ),
        });
    }
    let bytes = match read_bytes(path) {
        Ok(bytes) => bytes,
        Err(reason) => return Ok(LoadedWorkbook::Unavailable(reason)),
    };
    let book = Workbook::from_json(&bytes).map_err(|e| ExtractError::InvalidWorkbook {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(LoadedWorkbook::Loaded {
        book,
        size: bytes.len() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(row: &[&str]) -> Vec<Option<String>> {
        row.iter()
            .map(|c| (!c.is_empty()).then(|| c.to_string()))
            .collect()
    }

    #[test]
    fn rows_join_with_tabs() {
        let sheet = Sheet::new(
            "Data",
            vec![
                cells(&["id", "name", ""]),
                cells(&["", "", ""]),
                cells(&["1", "", "x"]),
            ],
        );
        let lines = sheet.lines().unwrap();
        assert_eq!(lines.as_slice(), ["id\tname", "1\t\tx"]);
    }

    #[test]
    fn merged_cells_take_top_left_value() {
        let sheet = Sheet::new(
            "Merged",
            vec![cells(&["title", "", ""]), cells(&["", "", "z"])],
        )
        .with_merged(CellRange {
            first_row: 0,
            first_col: 0,
            last_row: 1,
            last_col: 1,
        });
        let lines = sheet.lines().unwrap();
        assert_eq!(lines.as_slice(), ["title\ttitle", "title\ttitle\tz"]);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let sheet = Sheet::new("Bad", vec![]).with_merged(CellRange {
            first_row: 2,
            first_col: 0,
            last_row: 1,
            last_col: 0,
        });
        assert!(matches!(
            sheet.lines(),
            Err(ExtractError::InvalidMergedRange { .. })
        ));
    }

    #[test]
    fn sheets_align_by_sorted_name() {
        let dev = Workbook::new(vec![
            Sheet::new("b", vec![cells(&["b1"])]),
            Sheet::new("a", vec![cells(&["a1"])]),
        ]);
        let prod = Workbook::new(vec![
            Sheet::new("c", vec![cells(&["c1"])]),
            Sheet::new("a", vec![cells(&["a2"])]),
        ]);
        let (dev_side, prod_side) = sides_from_workbooks("dev", &dev, "prod", &prod).unwrap();
        let dev_pages = dev_side.pages.unwrap();
        let prod_pages = prod_side.pages.unwrap();
        assert_eq!(dev_pages.len(), 3);
        assert_eq!(prod_pages.len(), 3);
        // a, b, c
        assert_eq!(dev_pages[0].as_slice(), ["a1"]);
        assert_eq!(prod_pages[0].as_slice(), ["a2"]);
        assert_eq!(dev_pages[1].as_slice(), ["b1"]);
        assert!(prod_pages[1].is_empty());
        assert!(dev_pages[2].is_empty());
    }

    #[test]
    fn sheet_counts_are_per_side() {
        let dev = Workbook::new(vec![Sheet::new("only", vec![cells(&["x", "y"])])]);
        let prod = Workbook::new(vec![
            Sheet::new("one", vec![cells(&["a"])]),
            Sheet::new("two", vec![cells(&["b", "", "c"]), cells(&["d"])]),
            Sheet::new("three", vec![]),
        ]);
        let (dev_side, prod_side) = sides_from_workbooks("dev", &dev, "prod", &prod).unwrap();
        assert_eq!(dev_side.pages.as_ref().map(Vec::len), Some(4));
        assert_eq!(dev_side.page_count(), Some(1));
        assert_eq!(prod_side.page_count(), Some(3));
        // "x\ty" | "a", "b\t\tc", "d"
        assert_eq!(dev_side.cells, Some(2));
        assert_eq!(prod_side.cells, Some(1 + 3 + 1));
    }

    #[test]
    fn workbook_json_round_trips_merged_default() {
        let book = Workbook::from_json(br#"{"sheets":[{"name":"S","rows":[["a",null]]}]}"#)
            .unwrap();
        assert!(book.sheets[0].merged.is_empty());
        assert_eq!(book.sheets[0].lines().unwrap().as_slice(), ["a"]);
    }

    #[test]
    fn native_workbook_is_unsupported() {
        assert!(matches!(
            load_workbook(Path::new("report.xlsx")),
            Err(ExtractError::Unsupported { .. })
        ));
    }
}
