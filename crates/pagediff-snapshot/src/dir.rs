//! Directory-backed snapshot store.
//!
//! Each snapshot is one pretty-printed JSON file named by
//! [`AnalyticsSnapshot::file_name`]. Loading picks up every file ending in
//! `_analytics.json`, in name order, and skips files that cannot be read or
//! parsed.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{SnapshotError, SnapshotResult};
use crate::snapshot::{AnalyticsSnapshot, SNAPSHOT_SUFFIX};
use crate::store::SnapshotStore;

/// A [`SnapshotStore`] over a directory of JSON files.
#[derive(Clone, Debug)]
pub struct DirSnapshotStore {
    root: PathBuf,
}

impl DirSnapshotStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn create(root: impl Into<PathBuf>) -> SnapshotResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| SnapshotError::io(&root, e))?;
        Ok(Self { root })
    }

    /// Open an existing directory.
    pub fn open(root: impl Into<PathBuf>) -> SnapshotResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(SnapshotError::MissingDirectory(root));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn snapshot_files(&self) -> SnapshotResult<Vec<PathBuf>> {
        let entries = std::fs::read_dir(&self.root).map_err(|e| SnapshotError::io(&self.root, e))?;
        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.ends_with(SNAPSHOT_SUFFIX))
            })
            .collect();
        files.sort();
        Ok(files)
    }

    fn read_snapshot(path: &Path) -> SnapshotResult<AnalyticsSnapshot> {
        let bytes = std::fs::read(path).map_err(|e| SnapshotError::io(path, e))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl SnapshotStore for DirSnapshotStore {
    fn save(&self, snapshot: &AnalyticsSnapshot) -> SnapshotResult<String> {
        let name = snapshot.file_name();
        let path = self.root.join(&name);
        let json = serde_json::to_vec_pretty(snapshot)?;
        std::fs::write(&path, json).map_err(|e| SnapshotError::io(&path, e))?;
        debug!(path = %path.display(), "saved snapshot");
        Ok(name)
    }

    fn load_all(&self) -> SnapshotResult<Vec<AnalyticsSnapshot>> {
        let mut snapshots = Vec::new();
        for path in self.snapshot_files()? {
            match Self::read_snapshot(&path) {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable snapshot"),
            }
        }
        debug!(root = %self.root.display(), count = snapshots.len(), "loaded snapshots");
        Ok(snapshots)
    }

    fn len(&self) -> SnapshotResult<usize> {
        Ok(self.snapshot_files()?.len())
    }
}
