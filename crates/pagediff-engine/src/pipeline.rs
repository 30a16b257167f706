//! End-to-end comparison: segment, dispatch, aggregate.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use pagediff_diff::{LineDiffer, UnitDiffer};
use pagediff_extract::extract_pair;
use pagediff_types::{
    DocumentAnalytics, DocumentPair, FileKind, SideContent, SideCounts, SideStatus, UnitFailure,
    UnitResult,
};

use crate::aggregate::aggregate;
use crate::cancel::CancelFlag;
use crate::config::EngineConfig;
use crate::dispatch::{Dispatcher, ProgressSender};
use crate::error::{EngineError, EngineResult};
use crate::segment::segment;

/// One comparison to run, with its per-run overrides.
#[derive(Clone, Debug)]
pub struct ComparisonRequest {
    pub pair: DocumentPair,
    /// Overrides the configured unit size for this run.
    pub unit_lines: Option<usize>,
    /// Overrides the configured worker count for this run.
    pub workers: Option<usize>,
    pub cancel: CancelFlag,
}

impl ComparisonRequest {
    pub fn new(pair: DocumentPair) -> Self {
        Self {
            pair,
            unit_lines: None,
            workers: None,
            cancel: CancelFlag::default(),
        }
    }

    pub fn with_unit_lines(mut self, unit_lines: usize) -> Self {
        self.unit_lines = Some(unit_lines);
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Identity of one compared side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SideSummary {
    pub name: String,
    pub size_bytes: u64,
    pub status: SideStatus,
}

impl From<&SideContent> for SideSummary {
    fn from(side: &SideContent) -> Self {
        Self {
            name: side.name.clone(),
            size_bytes: side.size_bytes,
            status: side.status.clone(),
        }
    }
}

/// Immutable output of a comparison.
#[derive(Clone, Debug, Serialize)]
pub struct ComparisonResult {
    pub kind: FileKind,
    pub dev: SideSummary,
    pub prod: SideSummary,
    /// Per-unit results in document order.
    pub units: Vec<UnitResult>,
    pub analytics: DocumentAnalytics,
    /// Units that could not be compared and were counted as empty.
    pub failures: Vec<UnitFailure>,
}

impl ComparisonResult {
    /// Returns `true` if some units or one side could not be compared.
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
            || self.dev.status != SideStatus::Extracted
            || self.prod.status != SideStatus::Extracted
    }

    /// Units with at least one change.
    pub fn changed_units(&self) -> impl Iterator<Item = &UnitResult> {
        self.units.iter().filter(|u| u.has_changes())
    }
}

/// Extract both files of a pair on the blocking pool.
pub async fn load_pair(kind: FileKind, dev: &Path, prod: &Path) -> EngineResult<DocumentPair> {
    let (dev, prod) = (dev.to_path_buf(), prod.to_path_buf());
    let pair = tokio::task::spawn_blocking(move || extract_pair(kind, &dev, &prod)).await??;
    Ok(pair)
}

/// Cell totals, when either side counted cells.
fn side_cells(pair: &DocumentPair) -> Option<SideCounts> {
    match (pair.dev.cells, pair.prod.cells) {
        (None, None) => None,
        (dev, prod) => Some(SideCounts::new(dev.unwrap_or(0), prod.unwrap_or(0))),
    }
}

/// Runs comparisons with a fixed configuration.
pub struct Comparator {
    config: EngineConfig,
    differ: Option<Arc<dyn UnitDiffer>>,
    progress: Option<ProgressSender>,
}

impl Comparator {
    /// Create a comparator after validating `config`.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            differ: None,
            progress: None,
        })
    }

    /// Send per-unit progress events to `progress`.
    pub fn with_progress(mut self, progress: ProgressSender) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Replace the built-in [`LineDiffer`].
    pub fn with_differ(mut self, differ: Arc<dyn UnitDiffer>) -> Self {
        self.differ = Some(differ);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Extract both files and compare them.
    pub async fn compare_files(
        &self,
        kind: FileKind,
        dev: &Path,
        prod: &Path,
        cancel: CancelFlag,
    ) -> EngineResult<ComparisonResult> {
        let pair = load_pair(kind, dev, prod).await?;
        self.compare(ComparisonRequest::new(pair).with_cancel(cancel)).await
    }

    /// Compare an extracted document pair.
    pub async fn compare(&self, request: ComparisonRequest) -> EngineResult<ComparisonResult> {
        let ComparisonRequest {
            pair,
            unit_lines,
            workers,
            cancel,
        } = request;

        if let (SideStatus::Unavailable { reason: dev }, SideStatus::Unavailable { reason: prod }) =
            (&pair.dev.status, &pair.prod.status)
        {
            return Err(EngineError::BothSidesEmpty {
                dev: dev.clone(),
                prod: prod.clone(),
            });
        }
        for side in [&pair.dev, &pair.prod] {
            if let SideStatus::Unavailable { reason } = &side.status {
                warn!(side = %side.name, %reason, "side unavailable, comparing against empty");
            }
        }

        let unit_lines = unit_lines.unwrap_or_else(|| self.config.unit_lines_for(pair.kind));
        let workers = workers.unwrap_or_else(|| self.config.worker_count());
        if workers == 0 {
            return Err(EngineError::invalid_config("workers must be at least 1"));
        }

        let segmentation = segment(&pair, unit_lines)?;
        let layout = segmentation.layout;
        let words = self.config.word_sampling.policy_for(layout.units);
        let differ: Arc<dyn UnitDiffer> = match &self.differ {
            Some(differ) => Arc::clone(differ),
            None => Arc::new(LineDiffer::new(self.config.algorithm, words)),
        };

        info!(
            kind = %pair.kind,
            dev = %pair.dev.name,
            prod = %pair.prod.name,
            units = layout.units,
            workers,
            unit_lines,
            "starting comparison"
        );

        let mut dispatcher = Dispatcher::new(differ, workers).with_cancel(cancel);
        if let Some(progress) = &self.progress {
            dispatcher = dispatcher.with_progress(progress.clone());
        }
        let report = dispatcher.run(segmentation.units).await?;

        let failed_units = u32::try_from(report.failures.len()).unwrap_or(u32::MAX);
        let mut analytics = aggregate(&report.results, layout, words, failed_units);
        analytics.cells = side_cells(&pair);

        info!(
            units = layout.units,
            similarity = analytics.overall_similarity,
            added = analytics.changes.added,
            removed = analytics.changes.removed,
            modified = analytics.changes.modified,
            failed = failed_units,
            "comparison finished"
        );

        Ok(ComparisonResult {
            kind: pair.kind,
            dev: SideSummary::from(&pair.dev),
            prod: SideSummary::from(&pair.prod),
            units: report.results,
            analytics,
            failures: report.failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use pagediff_diff::{DiffError, DiffResult};
    use pagediff_types::{LineSequence, LineTag, Unit, WordEstimate};
    use tokio::sync::mpsc;

    use super::*;

    fn lines(prefix: &str, n: usize) -> LineSequence {
        (0..n).map(|i| format!("{prefix} line {i}")).collect()
    }

    fn comparator() -> Comparator {
        Comparator::new(EngineConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn identical_documents() {
        let text = lines("same", 1200);
        let result = comparator()
            .compare(ComparisonRequest::new(DocumentPair::text(text.clone(), text)))
            .await
            .unwrap();
        let a = &result.analytics;
        assert_eq!(a.changes.added, 0);
        assert_eq!(a.changes.removed, 0);
        assert_eq!(a.changes.modified, 0);
        assert_eq!(a.changes.unchanged, 1200);
        assert_eq!(a.overall_similarity, 1.0);
        assert_eq!(a.layout.units, 3);
        assert!(!result.is_partial());
    }

    #[tokio::test]
    async fn document_against_empty_prod() {
        let result = comparator()
            .compare(
                ComparisonRequest::new(DocumentPair::text(
                    lines("dev", 1000),
                    LineSequence::empty(),
                ))
                .with_unit_lines(500),
            )
            .await
            .unwrap();
        assert_eq!(result.units.len(), 2);
        for unit in &result.units {
            assert_eq!(unit.counts.removed, 500);
            assert_eq!(unit.counts.added, 0);
        }
        assert_eq!(result.analytics.changes.removed, 1000);
        assert_eq!(result.analytics.overall_similarity, 0.0);
        assert_eq!(result.analytics.similarity_percent(), 0);
    }

    #[tokio::test]
    async fn single_substitution() {
        let pair = DocumentPair::text(vec!["a", "b", "c"], vec!["a", "x", "c"]);
        let result = comparator()
            .compare(ComparisonRequest::new(pair).with_unit_lines(3))
            .await
            .unwrap();
        assert_eq!(result.units.len(), 1);
        let a = &result.analytics;
        assert_eq!(a.changes.removed, 1);
        assert_eq!(a.changes.added, 1);
        assert_eq!(a.changes.unchanged, 2);
        assert!(a.overall_similarity > 0.6 && a.overall_similarity < 0.9);
    }

    #[tokio::test]
    async fn both_sides_empty_is_fully_similar() {
        let pair = DocumentPair::text(LineSequence::empty(), LineSequence::empty());
        let result = comparator()
            .compare(ComparisonRequest::new(pair))
            .await
            .unwrap();
        assert!(result.units.is_empty());
        assert_eq!(result.analytics.overall_similarity, 1.0);
        assert_eq!(result.analytics.changes.total_changes(), 0);
    }

    #[tokio::test]
    async fn both_sides_unavailable_is_fatal() {
        let pair = DocumentPair::new(
            FileKind::Text,
            SideContent::unavailable("a.txt", "not found"),
            SideContent::unavailable("b.txt", "permission denied"),
        );
        let err = comparator()
            .compare(ComparisonRequest::new(pair))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::BothSidesEmpty { .. }));
    }

    #[tokio::test]
    async fn one_side_unavailable_is_partial() {
        let pair = DocumentPair::new(
            FileKind::Text,
            SideContent::from_lines("a.txt", lines("dev", 10)),
            SideContent::unavailable("b.txt", "not found"),
        );
        let result = comparator()
            .compare(ComparisonRequest::new(pair))
            .await
            .unwrap();
        assert!(result.is_partial());
        assert_eq!(result.analytics.changes.removed, 10);
    }

    #[tokio::test]
    async fn repeated_runs_are_byte_identical() {
        let dev = lines("dev", 2300);
        let prod: LineSequence = dev
            .iter()
            .enumerate()
            .filter(|(i, _)| i % 7 != 0)
            .map(|(i, l)| if i % 11 == 0 { format!("{l} edited") } else { l.clone() })
            .collect();
        let run = |workers| {
            let pair = DocumentPair::text(dev.clone(), prod.clone());
            async move {
                comparator()
                    .compare(ComparisonRequest::new(pair).with_workers(workers))
                    .await
                    .unwrap()
            }
        };
        let first = run(1).await;
        let second = run(8).await;
        assert_eq!(
            serde_json::to_vec(&first.analytics).unwrap(),
            serde_json::to_vec(&second.analytics).unwrap()
        );
        assert_eq!(first.units, second.units);
    }

    #[tokio::test]
    async fn unit_size_does_not_skew_similarity_of_clean_documents() {
        let text = lines("same", 1000);
        for unit_lines in [7, 100, 1000] {
            let result = comparator()
                .compare(
                    ComparisonRequest::new(DocumentPair::text(text.clone(), text.clone()))
                        .with_unit_lines(unit_lines),
                )
                .await
                .unwrap();
            assert_eq!(result.analytics.overall_similarity, 1.0);
        }
    }

    #[tokio::test]
    async fn modified_lines_are_counted_once_per_pair() {
        let pair = DocumentPair::text(
            vec!["keep", "the quick brown fox"],
            vec!["keep", "the quick brown fix"],
        );
        let result = comparator()
            .compare(ComparisonRequest::new(pair))
            .await
            .unwrap();
        assert_eq!(result.analytics.changes.modified, 1);
        let markers = result.units[0]
            .diff
            .iter()
            .filter(|l| l.tag == LineTag::ChangeMarker)
            .count();
        assert_eq!(markers, 2);
    }

    #[tokio::test]
    async fn pages_become_units() {
        let pair = DocumentPair::new(
            FileKind::Pdf,
            SideContent::from_pages("a.pdf", vec![lines("p1", 3), lines("p2", 3)]),
            SideContent::from_pages("b.pdf", vec![lines("p1", 3)]),
        );
        let result = comparator()
            .compare(ComparisonRequest::new(pair))
            .await
            .unwrap();
        assert_eq!(result.units.len(), 2);
        assert_eq!(result.analytics.layout.dev_units, 2);
        assert_eq!(result.analytics.layout.prod_units, 1);
        assert_eq!(result.units[0].ratio(), 1.0);
        assert_eq!(result.units[1].counts.removed, 3);
    }

    #[tokio::test]
    async fn large_documents_sample_words() {
        let config = EngineConfig {
            text_unit_lines: 1,
            ..Default::default()
        };
        let text = lines("w", 250);
        let result = Comparator::new(config)
            .unwrap()
            .compare(ComparisonRequest::new(DocumentPair::text(text.clone(), text)))
            .await
            .unwrap();
        assert!(result.analytics.words.is_sampled());
        assert_eq!(
            result.analytics.words.estimate,
            WordEstimate::Sampled {
                every: 10,
                sampled_units: 25
            }
        );
        // Every line has three words.
        assert_eq!(result.analytics.words.dev, 750);
    }

    #[tokio::test]
    async fn progress_reaches_total() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let comparator = comparator().with_progress(tx);
        let pair = DocumentPair::text(lines("a", 50), lines("b", 50));
        comparator
            .compare(ComparisonRequest::new(pair).with_unit_lines(10))
            .await
            .unwrap();
        drop(comparator);
        let mut last = None;
        while let Some(event) = rx.recv().await {
            last = Some(event);
        }
        let last = last.unwrap();
        assert_eq!((last.completed, last.total), (5, 5));
    }

    #[tokio::test]
    async fn cancelled_run_returns_error() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        let err = comparator()
            .compare(
                ComparisonRequest::new(DocumentPair::text(lines("a", 10), lines("b", 10)))
                    .with_cancel(cancel),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Cancelled { .. }));
    }

    /// Sets the cancel flag while diffing `trigger`.
    struct CancelAt {
        trigger: u32,
        cancel: CancelFlag,
    }

    impl UnitDiffer for CancelAt {
        fn diff_unit(&self, unit: &Unit) -> DiffResult<UnitResult> {
            if unit.index == self.trigger {
                self.cancel.cancel();
            }
            std::thread::sleep(std::time::Duration::from_millis(2));
            LineDiffer::default().diff_unit(unit)
        }
    }

    #[tokio::test]
    async fn cancel_mid_run_stops_submitting() {
        let cancel = CancelFlag::new();
        let differ = Arc::new(CancelAt {
            trigger: 3,
            cancel: cancel.clone(),
        });
        let (tx, mut rx) = mpsc::unbounded_channel();
        let comparator = comparator().with_differ(differ).with_progress(tx);
        let err = comparator
            .compare(
                ComparisonRequest::new(DocumentPair::text(lines("a", 20), lines("b", 20)))
                    .with_unit_lines(1)
                    .with_workers(2)
                    .with_cancel(cancel),
            )
            .await
            .unwrap_err();
        drop(comparator);

        let EngineError::Cancelled { completed, total } = err else {
            panic!("expected cancellation, got {err:?}");
        };
        assert_eq!(total, 20);
        // The triggering unit and whatever was already running still finish.
        assert!(completed >= 4 && completed < total, "completed {completed}");

        let mut events = 0;
        while let Some(event) = rx.recv().await {
            assert_eq!(event.total, 20);
            events += 1;
        }
        assert_eq!(events, completed);
    }

    /// Fails every unit with an odd index.
    struct FailOdd;

    impl UnitDiffer for FailOdd {
        fn diff_unit(&self, unit: &Unit) -> DiffResult<UnitResult> {
            if unit.index % 2 == 1 {
                return Err(DiffError::Unit {
                    index: unit.index,
                    reason: "corrupt page".into(),
                });
            }
            LineDiffer::default().diff_unit(unit)
        }
    }

    #[tokio::test]
    async fn failed_units_degrade_analytics() {
        // Even pages are identical, odd pages differ completely.
        let page = |p: usize, side: &str| {
            if p % 2 == 0 {
                lines(&format!("page {p}"), 4)
            } else {
                lines(&format!("{side} page {p}"), 4)
            }
        };
        let pair = DocumentPair::new(
            FileKind::Pdf,
            SideContent::from_pages("a.pdf", (0..4).map(|p| page(p, "dev")).collect()),
            SideContent::from_pages("b.pdf", (0..4).map(|p| page(p, "prod")).collect()),
        );
        let result = comparator()
            .with_differ(Arc::new(FailOdd))
            .compare(ComparisonRequest::new(pair))
            .await
            .unwrap();

        assert!(result.is_partial());
        assert!(result.analytics.is_partial());
        assert_eq!(result.analytics.failed_units, 2);
        let failed: Vec<u32> = result.failures.iter().map(|f| f.index).collect();
        assert_eq!(failed, vec![1, 3]);
        assert!(result.failures[0].reason.contains("corrupt page"));

        for index in [1, 3] {
            assert_eq!(result.units[index].weight, 0);
            assert!(result.units[index].diff.is_empty());
        }
        let surviving: u64 = [0, 2].iter().map(|&i| result.units[i].weight).sum();
        assert_eq!(result.analytics.total_weight, surviving);
        // Only the identical pages are weighed.
        assert_eq!(result.analytics.overall_similarity, 1.0);
        assert_eq!(result.analytics.changes.total_changes(), 0);
    }

    #[tokio::test]
    async fn workbook_cells_reach_analytics() {
        let pair = DocumentPair::new(
            FileKind::Excel,
            SideContent::from_pages("a.json", vec![LineSequence::from(vec!["a\tb", "c"])])
                .with_cells(3),
            SideContent::from_pages("b.json", vec![LineSequence::from(vec!["a\tb"])])
                .with_cells(2),
        );
        let result = comparator()
            .compare(ComparisonRequest::new(pair))
            .await
            .unwrap();
        assert_eq!(result.analytics.cells, Some(SideCounts::new(3, 2)));

        let text = comparator()
            .compare(ComparisonRequest::new(DocumentPair::text(vec!["a"], vec!["a"])))
            .await
            .unwrap();
        assert_eq!(text.analytics.cells, None);
    }

    #[tokio::test]
    async fn compare_files_reads_text() {
        let dir = tempfile::tempdir().unwrap();
        let dev = dir.path().join("dev.txt");
        let prod = dir.path().join("prod.txt");
        std::fs::write(&dev, "one\ntwo\nthree\n").unwrap();
        std::fs::write(&prod, "one\n2\nthree\n").unwrap();
        let result = comparator()
            .compare_files(FileKind::Text, &dev, &prod, CancelFlag::new())
            .await
            .unwrap();
        assert_eq!(result.dev.name, "dev.txt");
        assert_eq!(result.prod.size_bytes, 12);
        assert_eq!(result.analytics.changes.unchanged, 2);
    }

    #[tokio::test]
    async fn compare_files_with_both_missing_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = comparator()
            .compare_files(
                FileKind::Text,
                &dir.path().join("a"),
                &dir.path().join("b"),
                CancelFlag::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::BothSidesEmpty { .. }));
    }
}
