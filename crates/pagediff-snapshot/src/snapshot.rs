//! The persisted, flat analytics record of one comparison.

use std::path::Path;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use pagediff_engine::ComparisonResult;
use pagediff_types::FileKind;

/// Display format of [`AnalyticsSnapshot::timestamp`].
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format of the timestamp embedded in snapshot file names.
pub const FILE_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Suffix every stored snapshot file name ends with.
pub const SNAPSHOT_SUFFIX: &str = "_analytics.json";

/// Flat snapshot of one comparison's analytics.
///
/// The key set is stable: batch summaries read snapshots written by older
/// runs, so fields are only ever added.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    pub timestamp: String,
    pub file_kind: FileKind,
    pub dev_file: String,
    pub prod_file: String,
    pub dev_size: u64,
    pub prod_size: u64,
    pub similarity_ratio: f64,
    pub similarity_percent: u32,
    pub difference_percent: u32,
    pub dev_units: u32,
    pub prod_units: u32,
    pub max_units: u32,
    pub dev_lines: u64,
    pub prod_lines: u64,
    pub added: u64,
    pub removed: u64,
    pub modified: u64,
    pub unchanged: u64,
    pub dev_chars: u64,
    pub prod_chars: u64,
    pub chars_diff: u64,
    pub dev_words: u64,
    pub prod_words: u64,
    pub words_diff: u64,
    pub words_sampled: bool,
    #[serde(default)]
    pub failed_units: u32,
    /// Spreadsheet cell counts; absent for other kinds.
    #[serde(default)]
    pub dev_cells: Option<u64>,
    #[serde(default)]
    pub prod_cells: Option<u64>,
    #[serde(default)]
    pub cells_diff: Option<u64>,
}

impl AnalyticsSnapshot {
    /// Snapshot `result` as of `at`.
    pub fn from_result(result: &ComparisonResult, at: NaiveDateTime) -> Self {
        let a = &result.analytics;
        Self {
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
            file_kind: result.kind,
            dev_file: result.dev.name.clone(),
            prod_file: result.prod.name.clone(),
            dev_size: result.dev.size_bytes,
            prod_size: result.prod.size_bytes,
            similarity_ratio: a.overall_similarity,
            similarity_percent: a.similarity_percent(),
            difference_percent: a.difference_percent(),
            dev_units: a.layout.dev_units,
            prod_units: a.layout.prod_units,
            max_units: a.layout.units,
            dev_lines: a.layout.dev_lines,
            prod_lines: a.layout.prod_lines,
            added: a.changes.added,
            removed: a.changes.removed,
            modified: a.changes.modified,
            unchanged: a.changes.unchanged,
            dev_chars: a.chars.dev,
            prod_chars: a.chars.prod,
            chars_diff: a.chars.diff(),
            dev_words: a.words.dev,
            prod_words: a.words.prod,
            words_diff: a.words.diff(),
            words_sampled: a.words.is_sampled(),
            failed_units: a.failed_units,
            dev_cells: a.cells.map(|c| c.dev),
            prod_cells: a.cells.map(|c| c.prod),
            cells_diff: a.cells.map(|c| c.diff()),
        }
    }

    /// Snapshot `result` as of now, in local time.
    pub fn capture(result: &ComparisonResult) -> Self {
        Self::from_result(result, Local::now().naive_local())
    }

    /// Added + removed + modified.
    pub fn total_changes(&self) -> u64 {
        self.added + self.removed + self.modified
    }

    /// File name for storing this snapshot:
    /// `<dev stem>_vs_<prod stem>_<stamp>_analytics.json`, spaces replaced
    /// by underscores.
    pub fn file_name(&self) -> String {
        let stamp = NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT)
            .map(|t| t.format(FILE_STAMP_FORMAT).to_string())
            .unwrap_or_else(|_| self.timestamp.replace([' ', ':', '-'], ""));
        let base = format!("{}_vs_{}", stem(&self.dev_file), stem(&self.prod_file));
        format!("{}_{stamp}{SNAPSHOT_SUFFIX}", base.replace(' ', "_"))
    }
}

fn stem(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string())
}
