use serde::{Deserialize, Serialize};

use crate::kind::FileKind;
use crate::lines::LineSequence;

/// Whether a side's content could be obtained.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SideStatus {
    #[default]
    Extracted,
    /// Extraction failed; the side is treated as empty.
    Unavailable { reason: String },
}

/// One side of a document pair as delivered by an extraction collaborator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SideContent {
    /// Display name (usually the file name).
    pub name: String,
    /// Size of the source artifact in bytes.
    pub size_bytes: u64,
    /// All lines of the side, in order.
    pub lines: LineSequence,
    /// Natural unit boundaries (pages or sheets), when the format has them.
    pub pages: Option<Vec<LineSequence>>,
    /// Pages the source really has, when `pages` was padded with empty
    /// pages to line up with the other side.
    pub declared_pages: Option<usize>,
    /// Cell count (tabs + 1 per row) for tabular sources.
    pub cells: Option<u64>,
    pub status: SideStatus,
}

impl SideContent {
    /// A side with no intrinsic pagination.
    pub fn from_lines(name: impl Into<String>, lines: LineSequence) -> Self {
        Self {
            name: name.into(),
            lines,
            ..Default::default()
        }
    }

    /// A paginated side. `lines` is the concatenation of every page.
    pub fn from_pages(name: impl Into<String>, pages: Vec<LineSequence>) -> Self {
        let lines = pages
            .iter()
            .flat_map(|p| p.iter().cloned())
            .collect::<LineSequence>();
        Self {
            name: name.into(),
            lines,
            pages: Some(pages),
            ..Default::default()
        }
    }

    /// A side whose extraction failed.
    pub fn unavailable(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: SideStatus::Unavailable {
                reason: reason.into(),
            },
            ..Default::default()
        }
    }

    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = size_bytes;
        self
    }

    pub fn with_declared_pages(mut self, pages: usize) -> Self {
        self.declared_pages = Some(pages);
        self
    }

    pub fn with_cells(mut self, cells: u64) -> Self {
        self.cells = Some(cells);
        self
    }

    pub fn is_available(&self) -> bool {
        matches!(self.status, SideStatus::Extracted)
    }

    /// Number of natural pages the source has, if the side is paginated.
    /// Alignment padding is not counted.
    pub fn page_count(&self) -> Option<usize> {
        self.pages
            .as_ref()
            .map(|pages| self.declared_pages.unwrap_or(pages.len()))
    }
}

/// The two extracted sides of one comparison.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentPair {
    pub kind: FileKind,
    pub dev: SideContent,
    pub prod: SideContent,
}

impl DocumentPair {
    pub fn new(kind: FileKind, dev: SideContent, prod: SideContent) -> Self {
        Self { kind, dev, prod }
    }

    /// Plain-text pair built from in-memory lines.
    pub fn text(dev: impl Into<LineSequence>, prod: impl Into<LineSequence>) -> Self {
        Self::new(
            FileKind::Text,
            SideContent::from_lines("dev", dev.into()),
            SideContent::from_lines("prod", prod.into()),
        )
    }

    /// Returns `true` if both sides carry natural pagination.
    pub fn is_paginated(&self) -> bool {
        self.dev.pages.is_some() && self.prod.pages.is_some()
    }
}
