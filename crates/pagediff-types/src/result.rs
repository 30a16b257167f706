use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use crate::diff_line::{DiffLine, LineTag};

/// Line-level change totals for a unit or a whole document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeCounts {
    pub added: u64,
    pub removed: u64,
    /// Paired removed/added lines with intraline hints, counted once per pair.
    pub modified: u64,
    pub unchanged: u64,
}

impl ChangeCounts {
    /// Classify a diff script.
    ///
    /// Hint lines count as `markers / 2` modifications (integer division),
    /// never as additions or removals.
    pub fn from_diff(diff: &[DiffLine]) -> Self {
        let mut counts = Self::default();
        let mut markers = 0u64;
        for line in diff {
            match line.tag {
                LineTag::Added => counts.added += 1,
                LineTag::Removed => counts.removed += 1,
                LineTag::Unchanged => counts.unchanged += 1,
                LineTag::ChangeMarker => markers += 1,
            }
        }
        counts.modified = markers / 2;
        counts
    }

    /// Added + removed + modified.
    pub fn total_changes(&self) -> u64 {
        self.added + self.removed + self.modified
    }

    /// Returns `true` if nothing was added, removed, or modified.
    pub fn is_clean(&self) -> bool {
        self.total_changes() == 0
    }
}

impl Add for ChangeCounts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            added: self.added + rhs.added,
            removed: self.removed + rhs.removed,
            modified: self.modified + rhs.modified,
            unchanged: self.unchanged + rhs.unchanged,
        }
    }
}

impl AddAssign for ChangeCounts {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Whitespace-separated word counts of a unit's two sides.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WordCounts {
    pub dev: u64,
    pub prod: u64,
}

/// Which units get their words counted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum WordPolicy {
    /// Every unit is counted.
    Exact,
    /// Only units whose index is a multiple of `every` are counted; document
    /// totals are extrapolated from them.
    Sampled { every: u32 },
}

impl WordPolicy {
    /// Whether the unit at `index` should have its words counted.
    pub fn includes(&self, index: u32) -> bool {
        match *self {
            WordPolicy::Exact => true,
            WordPolicy::Sampled { every } => index % every.max(1) == 0,
        }
    }
}

impl Default for WordPolicy {
    fn default() -> Self {
        WordPolicy::Exact
    }
}

/// Write-once output of diffing one unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitResult {
    /// Index of the unit this result belongs to.
    pub index: u32,
    /// The unit's edit script, in order.
    pub diff: Vec<DiffLine>,
    pub counts: ChangeCounts,
    /// `ratio * weight`. For the built-in differ this equals twice the
    /// number of matched characters and is therefore integral.
    pub similarity_weighted: f64,
    /// Character count of dev text plus prod text.
    pub weight: u64,
    pub dev_lines: u32,
    pub prod_lines: u32,
    pub dev_chars: u64,
    pub prod_chars: u64,
    /// Present only for units selected by the [`WordPolicy`].
    pub words: Option<WordCounts>,
}

impl UnitResult {
    /// The zero-weight placeholder substituted for a unit that failed.
    pub fn empty(index: u32) -> Self {
        Self {
            index,
            diff: Vec::new(),
            counts: ChangeCounts::default(),
            similarity_weighted: 0.0,
            weight: 0,
            dev_lines: 0,
            prod_lines: 0,
            dev_chars: 0,
            prod_chars: 0,
            words: None,
        }
    }

    /// The unit-local similarity ratio in `[0, 1]`; 1.0 for a unit with no
    /// content on either side.
    pub fn ratio(&self) -> f64 {
        if self.weight == 0 {
            1.0
        } else {
            self.similarity_weighted / self.weight as f64
        }
    }

    /// Returns `true` if the unit's edit script contains any change.
    pub fn has_changes(&self) -> bool {
        !self.counts.is_clean()
    }
}

/// A non-fatal failure while diffing one unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitFailure {
    pub index: u32,
    pub reason: String,
}

impl UnitFailure {
    pub fn new(index: u32, reason: impl Into<String>) -> Self {
        Self {
            index,
            reason: reason.into(),
        }
    }
}
