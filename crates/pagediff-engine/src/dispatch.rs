//! Bounded parallel execution of unit diffs.
//!
//! Each unit is diffed on tokio's blocking pool, at most `workers` at a time.
//! Results come back over a channel in completion order; the dispatcher
//! alone owns the results buffer and files each result under its unit index,
//! so the returned vector is always in document order.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, warn};

use pagediff_diff::{run_guarded, DiffResult, UnitDiffer};
use pagediff_types::{Unit, UnitFailure, UnitResult};

use crate::cancel::CancelFlag;
use crate::error::{EngineError, EngineResult};

/// "`completed` of `total` units done"; `index` is the unit that just
/// finished. `completed` increases by one with every event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitProgress {
    pub index: u32,
    pub completed: u32,
    pub total: u32,
}

/// Sender half of a progress channel.
pub type ProgressSender = mpsc::UnboundedSender<UnitProgress>;

/// Ordered results of one dispatch.
#[derive(Clone, Debug, Default)]
pub struct DispatchReport {
    /// One result per unit, in unit order. Failed units hold an empty result.
    pub results: Vec<UnitResult>,
    /// Units that failed, in unit order.
    pub failures: Vec<UnitFailure>,
}

/// Runs a [`UnitDiffer`] over many units with bounded concurrency.
pub struct Dispatcher {
    differ: Arc<dyn UnitDiffer>,
    workers: usize,
    progress: Option<ProgressSender>,
    cancel: CancelFlag,
}

impl Dispatcher {
    pub fn new(differ: Arc<dyn UnitDiffer>, workers: usize) -> Self {
        Self {
            differ,
            workers,
            progress: None,
            cancel: CancelFlag::default(),
        }
    }

    /// Report a [`UnitProgress`] event for every completed unit.
    pub fn with_progress(mut self, progress: ProgressSender) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Stop submitting units once `cancel` is set.
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Diff every unit and return the results in unit order.
    ///
    /// `units[i].index` must equal `i`. A unit whose diff fails or panics is
    /// recorded as a [`UnitFailure`] and given an empty result. If the run is
    /// cancelled, units already running are allowed to finish and
    /// [`EngineError::Cancelled`] is returned.
    pub async fn run(&self, units: Vec<Unit>) -> EngineResult<DispatchReport> {
        if self.workers == 0 {
            return Err(EngineError::invalid_config("workers must be at least 1"));
        }
        for (position, unit) in units.iter().enumerate() {
            if unit.index as usize != position {
                return Err(EngineError::invalid_config(format!(
                    "unit at position {position} carries index {}",
                    unit.index
                )));
            }
        }
        let total = u32::try_from(units.len())
            .map_err(|_| EngineError::invalid_config("too many units"))?;

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let (tx, mut rx) = mpsc::channel::<(u32, DiffResult<UnitResult>)>(self.workers);

        let submit = async move {
            let mut submitted = 0u32;
            for unit in units {
                if self.cancel.is_cancelled() {
                    break;
                }
                let Ok(permit) = semaphore.clone().acquire_owned().await else {
                    break;
                };
                // Waiting for a permit can take a while; re-check before
                // handing the unit to a worker.
                if self.cancel.is_cancelled() {
                    break;
                }
                let tx = tx.clone();
                let differ = Arc::clone(&self.differ);
                tokio::task::spawn_blocking(move || {
                    let index = unit.index;
                    let outcome = run_guarded(differ.as_ref(), &unit);
                    drop(unit);
                    // The receiver only goes away if the dispatch itself was
                    // dropped, in which case nobody wants the result.
                    let _ = tx.blocking_send((index, outcome));
                    drop(permit);
                });
                submitted += 1;
            }
            submitted
        };

        let collect = async {
            let mut slots: Vec<Option<UnitResult>> = vec![None; total as usize];
            let mut failures = Vec::new();
            let mut completed = 0u32;
            while let Some((index, outcome)) = rx.recv().await {
                completed += 1;
                let result = match outcome {
                    Ok(result) => result,
                    Err(e) => {
                        warn!(unit = index, error = %e, "unit diff failed, counting it as empty");
                        failures.push(UnitFailure::new(index, e.to_string()));
                        UnitResult::empty(index)
                    }
                };
                slots[index as usize] = Some(result);
                debug!(unit = index, completed, total, "unit completed");
                if let Some(progress) = &self.progress {
                    let _ = progress.send(UnitProgress {
                        index,
                        completed,
                        total,
                    });
                }
            }
            (slots, failures, completed)
        };

        let (submitted, (slots, mut failures, completed)) = tokio::join!(submit, collect);

        if submitted < total {
            return Err(EngineError::Cancelled { completed, total });
        }

        let results = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| {
                    let index = index as u32;
                    warn!(unit = index, "unit produced no result");
                    failures.push(UnitFailure::new(index, "unit was not completed"));
                    UnitResult::empty(index)
                })
            })
            .collect();
        failures.sort_by_key(|f| f.index);

        Ok(DispatchReport { results, failures })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use pagediff_diff::{DiffError, LineDiffer};
    use pagediff_types::LineSequence;

    use super::*;

    fn units(n: usize) -> Vec<Unit> {
        let dev: LineSequence = (0..n).map(|i| format!("line {i}")).collect();
        let prod: LineSequence = (0..n).map(|i| format!("line {}", i * 2)).collect();
        (0..n)
            .map(|i| {
                Unit::new(
                    i as u32,
                    dev.slice(i..i + 1).unwrap(),
                    prod.slice(i..i + 1).unwrap(),
                )
            })
            .collect()
    }

    /// Finishes later units first.
    struct Reversed {
        total: u32,
    }

    impl UnitDiffer for Reversed {
        fn diff_unit(&self, unit: &Unit) -> DiffResult<UnitResult> {
            std::thread::sleep(Duration::from_millis(u64::from(self.total - unit.index) * 3));
            LineDiffer::default().diff_unit(unit)
        }
    }

    struct FailOdd;

    impl UnitDiffer for FailOdd {
        fn diff_unit(&self, unit: &Unit) -> DiffResult<UnitResult> {
            match unit.index % 4 {
                1 => Err(DiffError::Unit {
                    index: unit.index,
                    reason: "unreadable".into(),
                }),
                3 => panic!("unit {} exploded", unit.index),
                _ => LineDiffer::default().diff_unit(unit),
            }
        }
    }

    /// Tracks the highest number of concurrently running diffs.
    struct Gauge {
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    impl UnitDiffer for Gauge {
        fn diff_unit(&self, unit: &Unit) -> DiffResult<UnitResult> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(5));
            self.running.fetch_sub(1, Ordering::SeqCst);
            Ok(UnitResult::empty(unit.index))
        }
    }

    #[tokio::test]
    async fn results_come_back_in_unit_order() {
        let dispatcher = Dispatcher::new(Arc::new(Reversed { total: 12 }), 4);
        let report = dispatcher.run(units(12)).await.unwrap();
        assert_eq!(report.results.len(), 12);
        for (i, r) in report.results.iter().enumerate() {
            assert_eq!(r.index as usize, i);
        }
        assert!(report.failures.is_empty());
    }

    #[tokio::test]
    async fn progress_is_monotonic() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = Dispatcher::new(Arc::new(LineDiffer::default()), 3).with_progress(tx);
        dispatcher.run(units(10)).await.unwrap();
        drop(dispatcher);

        let mut seen = Vec::new();
        while let Some(event) = rx.recv().await {
            assert_eq!(event.total, 10);
            seen.push(event);
        }
        let completed: Vec<u32> = seen.iter().map(|e| e.completed).collect();
        assert_eq!(completed, (1..=10).collect::<Vec<_>>());
        let mut indices: Vec<u32> = seen.iter().map(|e| e.index).collect();
        indices.sort_unstable();
        assert_eq!(indices, (0..10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn failures_degrade_to_empty_results() {
        let dispatcher = Dispatcher::new(Arc::new(FailOdd), 2);
        let report = dispatcher.run(units(8)).await.unwrap();
        assert_eq!(report.results.len(), 8);
        let failed: Vec<u32> = report.failures.iter().map(|f| f.index).collect();
        assert_eq!(failed, vec![1, 3, 5, 7]);
        for index in failed {
            assert_eq!(report.results[index as usize], UnitResult::empty(index));
        }
        assert!(report.results[0].weight > 0);
        assert!(report.failures[1].reason.contains("exploded"));
    }

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let gauge = Arc::new(Gauge {
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let dispatcher = Dispatcher::new(gauge.clone(), 3);
        dispatcher.run(units(20)).await.unwrap();
        let peak = gauge.peak.load(Ordering::SeqCst);
        assert!(peak >= 1 && peak <= 3, "peak concurrency was {peak}");
    }

    #[tokio::test]
    async fn cancelled_before_start_submits_nothing() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        let dispatcher = Dispatcher::new(Arc::new(LineDiffer::default()), 2).with_cancel(cancel);
        let err = dispatcher.run(units(5)).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Cancelled {
                completed: 0,
                total: 5
            }
        ));
    }

    #[tokio::test]
    async fn empty_input_is_fine() {
        let dispatcher = Dispatcher::new(Arc::new(LineDiffer::default()), 2);
        let report = dispatcher.run(Vec::new()).await.unwrap();
        assert!(report.results.is_empty());
    }

    #[tokio::test]
    async fn misnumbered_units_rejected() {
        let mut input = units(3);
        input[1].index = 7;
        let dispatcher = Dispatcher::new(Arc::new(LineDiffer::default()), 2);
        assert!(matches!(
            dispatcher.run(input).await,
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn zero_workers_rejected() {
        let dispatcher = Dispatcher::new(Arc::new(LineDiffer::default()), 0);
        assert!(dispatcher.run(units(1)).await.is_err());
    }
}
