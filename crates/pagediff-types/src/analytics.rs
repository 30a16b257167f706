use serde::{Deserialize, Serialize};

use crate::result::ChangeCounts;

/// A dev/prod pair of totals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SideCounts {
    pub dev: u64,
    pub prod: u64,
}

impl SideCounts {
    pub fn new(dev: u64, prod: u64) -> Self {
        Self { dev, prod }
    }

    /// Absolute difference between the two sides.
    pub fn diff(&self) -> u64 {
        self.dev.abs_diff(self.prod)
    }

    pub fn max(&self) -> u64 {
        self.dev.max(self.prod)
    }
}

/// How the document was cut into units, per side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitLayout {
    /// Total number of units compared.
    pub units: u32,
    /// Units (or pages) that exist on the dev side.
    pub dev_units: u32,
    /// Units (or pages) that exist on the prod side.
    pub prod_units: u32,
    pub dev_lines: u64,
    pub prod_lines: u64,
}

/// Whether a word total was counted exactly or extrapolated from a sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum WordEstimate {
    #[default]
    Exact,
    Sampled {
        /// Sampling interval in units.
        every: u32,
        /// Number of units whose words were actually counted.
        sampled_units: u32,
    },
}

/// Document word totals with their provenance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WordTally {
    pub dev: u64,
    pub prod: u64,
    pub estimate: WordEstimate,
}

impl WordTally {
    pub fn is_sampled(&self) -> bool {
        matches!(self.estimate, WordEstimate::Sampled { .. })
    }

    pub fn diff(&self) -> u64 {
        self.dev.abs_diff(self.prod)
    }
}

/// Whole-document aggregate of every unit result.
///
/// Built once per comparison and handed read-only to renderers and the
/// snapshot layer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentAnalytics {
    pub changes: ChangeCounts,
    /// Sum of every unit's `similarity_weighted`.
    pub similarity_weighted: f64,
    /// Sum of every unit's weight (characters on both sides).
    pub total_weight: u64,
    /// `similarity_weighted / total_weight`, or 1.0 when there is no content.
    pub overall_similarity: f64,
    pub layout: UnitLayout,
    pub chars: SideCounts,
    pub words: WordTally,
    /// Units whose diff failed and were counted as empty.
    pub failed_units: u32,
    /// Cell totals for tabular sources; `None` for other kinds.
    #[serde(default)]
    pub cells: Option<SideCounts>,
}

impl DocumentAnalytics {
    /// Similarity as a whole percentage, truncated toward zero.
    pub fn similarity_percent(&self) -> u32 {
        (self.overall_similarity * 100.0).floor().clamp(0.0, 100.0) as u32
    }

    /// `100 - similarity` as a percentage, truncated toward zero. This is
    /// not always `100 - similarity_percent`: 95.5 % similar is 4 % different.
    pub fn difference_percent(&self) -> u32 {
        (100.0 - self.overall_similarity * 100.0).clamp(0.0, 100.0) as u32
    }

    /// Returns `true` if some units could not be compared.
    pub fn is_partial(&self) -> bool {
        self.failed_units > 0
    }
}
