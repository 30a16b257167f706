use crate::lines::LineSlice;

/// An index-aligned pair of dev and prod slices, compared independently.
///
/// The index is assigned at segmentation time and is the only ordering key
/// downstream. A unit holds no state about its neighbours.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Unit {
    /// 0-based position of this unit in the document.
    pub index: u32,
    /// Dev-side lines (empty when the dev side ends before this unit).
    pub dev: LineSlice,
    /// Prod-side lines (empty when the prod side ends before this unit).
    pub prod: LineSlice,
}

impl Unit {
    pub fn new(index: u32, dev: LineSlice, prod: LineSlice) -> Self {
        Self { index, dev, prod }
    }

    /// Returns `true` if neither side has any lines.
    pub fn is_empty(&self) -> bool {
        self.dev.is_empty() && self.prod.is_empty()
    }
}
