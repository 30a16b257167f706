//! The [`SnapshotStore`] trait and its in-memory implementation.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::{SnapshotError, SnapshotResult};
use crate::snapshot::AnalyticsSnapshot;

/// Storage backend for analytics snapshots.
///
/// Snapshots are keyed by [`AnalyticsSnapshot::file_name`]; saving a snapshot
/// under an existing key replaces it.
pub trait SnapshotStore: Send + Sync {
    /// Store a snapshot and return its key.
    fn save(&self, snapshot: &AnalyticsSnapshot) -> SnapshotResult<String>;

    /// Every stored snapshot, ordered by key.
    fn load_all(&self) -> SnapshotResult<Vec<AnalyticsSnapshot>>;

    /// Number of stored snapshots.
    fn len(&self) -> SnapshotResult<usize> {
        Ok(self.load_all()?.len())
    }

    fn is_empty(&self) -> SnapshotResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// An in-memory [`SnapshotStore`]. Data is lost when the store is dropped.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    snapshots: RwLock<BTreeMap<String, AnalyticsSnapshot>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn save(&self, snapshot: &AnalyticsSnapshot) -> SnapshotResult<String> {
        let key = snapshot.file_name();
        self.snapshots
            .write()
            .map_err(|e| SnapshotError::LockPoisoned(e.to_string()))?
            .insert(key.clone(), snapshot.clone());
        Ok(key)
    }

    fn load_all(&self) -> SnapshotResult<Vec<AnalyticsSnapshot>> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|e| SnapshotError::LockPoisoned(e.to_string()))?;
        Ok(snapshots.values().cloned().collect())
    }

    fn len(&self) -> SnapshotResult<usize> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|e| SnapshotError::LockPoisoned(e.to_string()))?;
        Ok(snapshots.len())
    }
}
