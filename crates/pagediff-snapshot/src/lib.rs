//! Analytics snapshots for pagediff.
//!
//! A finished comparison is flattened into an [`AnalyticsSnapshot`] with a
//! stable key schema and persisted through a [`SnapshotStore`]. Stored
//! snapshots from many runs are later folded into a [`BatchSummary`].
//!
//! # Key Types
//!
//! - [`AnalyticsSnapshot`] -- Flat, persisted analytics of one comparison
//! - [`SnapshotStore`] -- Storage trait, with [`InMemorySnapshotStore`] and [`DirSnapshotStore`]
//! - [`BatchSummary`] / [`SimilarityBuckets`] -- Cross-document totals and rankings

pub mod dir;
pub mod error;
pub mod snapshot;
pub mod store;
pub mod summary;

pub use dir::DirSnapshotStore;
pub use error::{SnapshotError, SnapshotResult};
pub use snapshot::{AnalyticsSnapshot, FILE_STAMP_FORMAT, SNAPSHOT_SUFFIX, TIMESTAMP_FORMAT};
pub use store::{InMemorySnapshotStore, SnapshotStore};
pub use summary::{BatchSummary, SimilarityBuckets, RANKED_LEN};
