//! Cross-document summary over many stored snapshots.

use serde::{Deserialize, Serialize};

use pagediff_types::{ChangeCounts, SideCounts};

use crate::snapshot::AnalyticsSnapshot;

/// How many entries the ranked lists keep.
pub const RANKED_LEN: usize = 5;

/// Snapshot counts per similarity band.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarityBuckets {
    /// Exactly 100 %.
    pub identical: u32,
    /// 90 – 99 %.
    pub high: u32,
    /// 70 – 89 %.
    pub medium: u32,
    /// Below 70 %.
    pub low: u32,
}

impl SimilarityBuckets {
    fn count(&mut self, percent: u32) {
        match percent {
            100.. => self.identical += 1,
            90..=99 => self.high += 1,
            70..=89 => self.medium += 1,
            _ => self.low += 1,
        }
    }
}

/// Summed analytics over a batch of comparisons.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_files: u32,
    pub changes: ChangeCounts,
    /// Added + removed + modified over every file.
    pub total_changes: u64,
    /// Mean of every file's similarity ratio.
    pub average_similarity: f64,
    /// `average_similarity` as a whole percentage, truncated.
    pub average_percent: u32,
    pub buckets: SimilarityBuckets,
    pub lines: SideCounts,
    pub chars: SideCounts,
    /// Files with the most changes, most first.
    pub most_changed: Vec<AnalyticsSnapshot>,
    /// Files with the lowest similarity, least similar first.
    pub least_similar: Vec<AnalyticsSnapshot>,
}

impl BatchSummary {
    /// Summarize `snapshots`. Ties in the ranked lists keep input order.
    pub fn from_snapshots(snapshots: &[AnalyticsSnapshot]) -> Self {
        if snapshots.is_empty() {
            return Self::default();
        }

        let mut summary = Self {
            total_files: u32::try_from(snapshots.len()).unwrap_or(u32::MAX),
            ..Self::default()
        };
        let mut ratio_sum = 0.0;
        for s in snapshots {
            summary.changes += ChangeCounts {
                added: s.added,
                removed: s.removed,
                modified: s.modified,
                unchanged: s.unchanged,
            };
            ratio_sum += s.similarity_ratio;
            summary.buckets.count(s.similarity_percent);
            summary.lines.dev += s.dev_lines;
            summary.lines.prod += s.prod_lines;
            summary.chars.dev += s.dev_chars;
            summary.chars.prod += s.prod_chars;
        }
        summary.total_changes = summary.changes.total_changes();
        summary.average_similarity = ratio_sum / snapshots.len() as f64;
        summary.average_percent =
            (summary.average_similarity * 100.0).floor().clamp(0.0, 100.0) as u32;

        let mut by_changes = snapshots.to_vec();
        by_changes.sort_by(|a, b| b.total_changes().cmp(&a.total_changes()));
        by_changes.truncate(RANKED_LEN);
        summary.most_changed = by_changes;

        let mut by_similarity = snapshots.to_vec();
        by_similarity.sort_by_key(|s| s.similarity_percent);
        by_similarity.truncate(RANKED_LEN);
        summary.least_similar = by_similarity;

        summary
    }
}
