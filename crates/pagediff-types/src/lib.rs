//! Foundation types for pagediff.
//!
//! This crate holds the data model shared by the diff engine, the
//! dispatcher, the extraction collaborators, and the snapshot layer. Every
//! other pagediff crate depends on `pagediff-types`.
//!
//! # Key Types
//!
//! - [`LineSequence`] / [`LineSlice`] -- Immutable, cheaply shared document sides
//! - [`Unit`] -- An index-aligned pair of slices compared independently
//! - [`DiffLine`] / [`LineTag`] -- One classified line of a unit's edit script
//! - [`UnitResult`] / [`ChangeCounts`] -- Write-once output of diffing one unit
//! - [`DocumentAnalytics`] -- Whole-document aggregate of all unit results
//! - [`DocumentPair`] / [`SideContent`] -- Extracted input handed to the engine
//! - [`FileKind`] -- Closed set of supported source formats

pub mod analytics;
pub mod diff_line;
pub mod document;
pub mod error;
pub mod kind;
pub mod lines;
pub mod result;
pub mod unit;

pub use analytics::{DocumentAnalytics, SideCounts, UnitLayout, WordEstimate, WordTally};
pub use diff_line::{DiffLine, LineTag};
pub use document::{DocumentPair, SideContent, SideStatus};
pub use error::TypeError;
pub use kind::FileKind;
pub use lines::{LineSequence, LineSlice};
pub use result::{ChangeCounts, UnitFailure, UnitResult, WordCounts, WordPolicy};
pub use unit::Unit;
