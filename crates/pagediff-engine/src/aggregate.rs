//! Folding unit results into document analytics.
//!
//! Every field of the accumulator is a plain sum, so folding is associative
//! and commutative: any completion order and any split into partial folds
//! yields the same totals. With the built-in differ each
//! `similarity_weighted` is an integer, which keeps the floating point sum
//! exact as well.

use pagediff_types::{
    ChangeCounts, DocumentAnalytics, SideCounts, UnitLayout, UnitResult, WordEstimate, WordPolicy,
    WordTally,
};

/// Running totals over any subset of unit results.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnalyticsAccumulator {
    pub changes: ChangeCounts,
    pub similarity_weighted: f64,
    pub total_weight: u64,
    pub dev_chars: u64,
    pub prod_chars: u64,
    pub dev_words: u64,
    pub prod_words: u64,
    /// Units that carried word counts.
    pub word_units: u32,
}

impl AnalyticsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit result.
    pub fn add(&mut self, result: &UnitResult) {
        self.changes += result.counts;
        self.similarity_weighted += result.similarity_weighted;
        self.total_weight += result.weight;
        self.dev_chars += result.dev_chars;
        self.prod_chars += result.prod_chars;
        if let Some(words) = result.words {
            self.dev_words += words.dev;
            self.prod_words += words.prod;
            self.word_units += 1;
        }
    }

    /// Combine two partial folds.
    pub fn merge(mut self, other: Self) -> Self {
        self.changes += other.changes;
        self.similarity_weighted += other.similarity_weighted;
        self.total_weight += other.total_weight;
        self.dev_chars += other.dev_chars;
        self.prod_chars += other.prod_chars;
        self.dev_words += other.dev_words;
        self.prod_words += other.prod_words;
        self.word_units += other.word_units;
        self
    }

    /// Produce the document analytics.
    ///
    /// Under a sampled word policy the counted words are scaled up from the
    /// sampled units to all `layout.units` units.
    pub fn finish(
        self,
        layout: UnitLayout,
        words: WordPolicy,
        failed_units: u32,
    ) -> DocumentAnalytics {
        let overall_similarity = if self.total_weight == 0 {
            1.0
        } else {
            (self.similarity_weighted / self.total_weight as f64).clamp(0.0, 1.0)
        };

        let words = match words {
            WordPolicy::Exact => WordTally {
                dev: self.dev_words,
                prod: self.prod_words,
                estimate: WordEstimate::Exact,
            },
            WordPolicy::Sampled { every } => WordTally {
                dev: extrapolate(self.dev_words, self.word_units, layout.units),
                prod: extrapolate(self.prod_words, self.word_units, layout.units),
                estimate: WordEstimate::Sampled {
                    every,
                    sampled_units: self.word_units,
                },
            },
        };

        DocumentAnalytics {
            changes: self.changes,
            similarity_weighted: self.similarity_weighted,
            total_weight: self.total_weight,
            overall_similarity,
            layout,
            chars: SideCounts::new(self.dev_chars, self.prod_chars),
            words,
            failed_units,
            cells: None,
        }
    }
}

/// `counted * units / sampled`, rounded to nearest.
fn extrapolate(counted: u64, sampled: u32, units: u32) -> u64 {
    if sampled == 0 {
        return 0;
    }
    let sampled = u128::from(sampled);
    let scaled = (u128::from(counted) * u128::from(units) + sampled / 2) / sampled;
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

/// Fold `results` into document analytics.
pub fn aggregate(
    results: &[UnitResult],
    layout: UnitLayout,
    words: WordPolicy,
    failed_units: u32,
) -> DocumentAnalytics {
    results
        .iter()
        .fold(AnalyticsAccumulator::new(), |mut acc, r| {
            acc.add(r);
            acc
        })
        .finish(layout, words, failed_units)
}
