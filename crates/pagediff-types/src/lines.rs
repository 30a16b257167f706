use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use crate::error::TypeError;

/// One side (dev or prod) of a document, as an ordered list of lines.
///
/// Immutable once extracted. Cloning is cheap (the lines are shared behind an
/// `Arc`), which lets every [`LineSlice`] refer back to the same storage
/// instead of copying its lines.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct LineSequence(Arc<[String]>);

impl LineSequence {
    /// Create a sequence from owned lines.
    pub fn new(lines: Vec<String>) -> Self {
        Self(lines.into())
    }

    /// An empty sequence.
    pub fn empty() -> Self {
        Self(Arc::from(Vec::new()))
    }

    /// Split text into lines. Line terminators (`\n`, `\r\n`) are dropped.
    pub fn from_text(text: &str) -> Self {
        text.lines().map(str::to_owned).collect()
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no lines.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow all lines.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Iterate over the lines.
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    /// A shared view of `range`. Fails if the range exceeds the sequence.
    pub fn slice(&self, range: Range<usize>) -> Result<LineSlice, TypeError> {
        if range.start > range.end || range.end > self.len() {
            return Err(TypeError::SliceOutOfBounds {
                start: range.start,
                end: range.end,
                len: self.len(),
            });
        }
        Ok(LineSlice {
            seq: self.clone(),
            range,
        })
    }

    /// A view of `range` clamped to the sequence bounds.
    ///
    /// A range starting at or past the end yields an empty slice, which is how
    /// a shorter side contributes to units beyond its end.
    pub fn slice_clamped(&self, range: Range<usize>) -> LineSlice {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        LineSlice {
            seq: self.clone(),
            range: start..end,
        }
    }

    /// A view covering every line.
    pub fn full(&self) -> LineSlice {
        LineSlice {
            seq: self.clone(),
            range: 0..self.len(),
        }
    }
}

impl Default for LineSequence {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Vec<String>> for LineSequence {
    fn from(lines: Vec<String>) -> Self {
        Self::new(lines)
    }
}

impl From<Vec<&str>> for LineSequence {
    fn from(lines: Vec<&str>) -> Self {
        lines.into_iter().map(str::to_owned).collect()
    }
}

impl FromIterator<String> for LineSequence {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Debug for LineSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LineSequence({} lines)", self.len())
    }
}

/// A contiguous, shared view into a [`LineSequence`].
#[derive(Clone, Default, PartialEq, Eq)]
pub struct LineSlice {
    seq: LineSequence,
    range: Range<usize>,
}

impl LineSlice {
    /// An empty slice not backed by any document.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The lines in this slice.
    pub fn lines(&self) -> &[String] {
        &self.seq.as_slice()[self.range.clone()]
    }

    /// Position of this slice within its sequence.
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.range.len()
    }

    /// Returns `true` if the slice has no lines.
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// The slice content as one string, lines joined with `\n`.
    pub fn text(&self) -> String {
        self.lines().join("\n")
    }
}

impl fmt::Debug for LineSlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LineSlice({}..{})", self.range.start, self.range.end)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn seq(lines: &[&str]) -> LineSequence {
        LineSequence::from(lines.to_vec())
    }

    #[test]
    fn from_text_drops_terminators() {
        let s = LineSequence::from_text("a\r\nb\nc\n");
        assert_eq!(s.as_slice(), &["a", "b", "c"]);
    }

    #[test]
    fn clone_shares_storage() {
        let a = seq(&["x", "y"]);
        let b = a.clone();
        assert!(std::ptr::eq(a.as_slice().as_ptr(), b.as_slice().as_ptr()));
    }

    #[test]
    fn slice_in_bounds() {
        let s = seq(&["a", "b", "c", "d"]);
        let slice = s.slice(1..3).unwrap();
        assert_eq!(slice.lines(), &["b", "c"]);
        assert_eq!(slice.text(), "b\nc");
    }

    #[test]
    fn slice_out_of_bounds_is_error() {
        let s = seq(&["a"]);
        let err = s.slice(0..2).unwrap_err();
        assert_eq!(
            err,
            TypeError::SliceOutOfBounds {
                start: 0,
                end: 2,
                len: 1
            }
        );
    }

    #[test]
    fn clamped_slice_past_end_is_empty() {
        let s = seq(&["a", "b"]);
        assert!(s.slice_clamped(4..6).is_empty());
        assert_eq!(s.slice_clamped(1..6).lines(), &["b"]);
    }

    #[test]
    fn empty_slice_text() {
        assert_eq!(LineSlice::empty().text(), "");
        assert!(LineSlice::empty().lines().is_empty());
    }

    proptest! {
        #[test]
        fn clamped_slice_stays_in_bounds(
            len in 0usize..50,
            start in 0usize..80,
            width in 0usize..80,
        ) {
            let s: LineSequence = (0..len).map(|i| i.to_string()).collect();
            let slice = s.slice_clamped(start..start + width);
            prop_assert!(slice.range().end <= len);
            prop_assert!(slice.len() <= width);
            if start < len {
                prop_assert_eq!(slice.range().start, start);
            } else {
                prop_assert!(slice.is_empty());
            }
        }
    }
}
