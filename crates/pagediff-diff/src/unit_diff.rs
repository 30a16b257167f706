//! Per-unit diffing: edit script, change counts, and weighted similarity.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::debug;

use pagediff_types::{ChangeCounts, Unit, UnitResult, WordCounts, WordPolicy};

use crate::error::{DiffError, DiffResult};
use crate::line_diff::{diff_lines, DiffAlgorithm};
use crate::matcher::SequenceMatcher;

/// Computes the [`UnitResult`] for a single unit.
///
/// Implementations must be pure: the result depends only on the unit's
/// content and index, so units can be diffed concurrently in any order.
pub trait UnitDiffer: Send + Sync {
    fn diff_unit(&self, unit: &Unit) -> DiffResult<UnitResult>;
}

/// The built-in differ: line edit script plus character-level similarity.
#[derive(Clone, Copy, Debug, Default)]
pub struct LineDiffer {
    pub algorithm: DiffAlgorithm,
    pub words: WordPolicy,
}

impl LineDiffer {
    pub fn new(algorithm: DiffAlgorithm, words: WordPolicy) -> Self {
        Self { algorithm, words }
    }
}

impl UnitDiffer for LineDiffer {
    fn diff_unit(&self, unit: &Unit) -> DiffResult<UnitResult> {
        let dev_lines = unit.dev.lines();
        let prod_lines = unit.prod.lines();

        let diff = diff_lines(dev_lines, prod_lines, self.algorithm);
        let counts = ChangeCounts::from_diff(&diff);

        let dev_text = unit.dev.text();
        let prod_text = unit.prod.text();
        let dev_chars: Vec<char> = dev_text.chars().collect();
        let prod_chars: Vec<char> = prod_text.chars().collect();

        // Identical text matches in full; skip the matcher.
        let matched = if dev_text == prod_text {
            dev_chars.len()
        } else {
            SequenceMatcher::new(&prod_chars).matched_elements(&dev_chars)
        };

        let words = self.words.includes(unit.index).then(|| WordCounts {
            dev: dev_text.split_whitespace().count() as u64,
            prod: prod_text.split_whitespace().count() as u64,
        });

        debug!(
            unit = unit.index,
            lines = diff.len(),
            matched,
            "diffed unit"
        );

        Ok(UnitResult {
            index: unit.index,
            diff,
            counts,
            similarity_weighted: (2 * matched) as f64,
            weight: (dev_chars.len() + prod_chars.len()) as u64,
            dev_lines: to_u32(dev_lines.len(), unit.index)?,
            prod_lines: to_u32(prod_lines.len(), unit.index)?,
            dev_chars: dev_chars.len() as u64,
            prod_chars: prod_chars.len() as u64,
            words,
        })
    }
}

fn to_u32(n: usize, index: u32) -> DiffResult<u32> {
    u32::try_from(n).map_err(|_| DiffError::Unit {
        index,
        reason: format!("unit has too many lines ({n})"),
    })
}

/// Run `differ` on `unit`, converting a panic or a mislabelled result into
/// a [`DiffError`] so one bad unit never takes down the comparison.
pub fn run_guarded(differ: &dyn UnitDiffer, unit: &Unit) -> DiffResult<UnitResult> {
    let outcome = catch_unwind(AssertUnwindSafe(|| differ.diff_unit(unit)));
    let result = match outcome {
        Ok(result) => result?,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            return Err(DiffError::Panicked {
                index: unit.index,
                message,
            });
        }
    };
    if result.index != unit.index {
        return Err(DiffError::IndexMismatch {
            expected: unit.index,
            actual: result.index,
        });
    }
    Ok(result)
}
