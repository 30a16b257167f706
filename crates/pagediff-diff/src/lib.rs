//! Diff engine for pagediff.
//!
//! Turns one [`Unit`](pagediff_types::Unit) into a write-once
//! [`UnitResult`](pagediff_types::UnitResult): a classified line edit script,
//! its change counts, and a character-level similarity weighted by the unit's
//! size.
//!
//! # Key Types
//!
//! - [`UnitDiffer`] / [`LineDiffer`] -- Pure per-unit differ and its built-in implementation
//! - [`diff_lines`] / [`DiffAlgorithm`] -- Line edit script with intraline change hints
//! - [`SequenceMatcher`] -- Longest-matching-block matcher behind ratios and hints
//! - [`run_guarded`] -- Runs a differ, turning panics into [`DiffError`]s

pub mod error;
pub mod line_diff;
pub mod matcher;
pub mod unit_diff;

pub use error::{DiffError, DiffResult};
pub use line_diff::{diff_lines, DiffAlgorithm};
pub use matcher::{Match, OpTag, Opcode, SequenceMatcher};
pub use unit_diff::{run_guarded, LineDiffer, UnitDiffer};
