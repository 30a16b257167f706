//! Paginated, parallel comparison engine for pagediff.
//!
//! Cuts a document pair into bounded units, diffs the units concurrently on a
//! bounded worker pool, puts the results back in document order, and folds
//! them into whole-document analytics that do not depend on how the document
//! was split or in which order units finished.
//!
//! # Key Types
//!
//! - [`Comparator`] / [`ComparisonRequest`] / [`ComparisonResult`] -- One comparison, end to end
//! - [`segment`] / [`Segmentation`] -- Fixed-size and page-aligned unit cutting
//! - [`Dispatcher`] / [`UnitProgress`] -- Bounded parallel unit execution with progress events
//! - [`AnalyticsAccumulator`] / [`aggregate`] -- Order-independent fold into [`DocumentAnalytics`](pagediff_types::DocumentAnalytics)
//! - [`EngineConfig`] -- Unit sizes, worker count, algorithm, word sampling

pub mod aggregate;
pub mod cancel;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod pipeline;
pub mod segment;

pub use aggregate::{aggregate, AnalyticsAccumulator};
pub use cancel::CancelFlag;
pub use config::{EngineConfig, WordSampling};
pub use dispatch::{DispatchReport, Dispatcher, ProgressSender, UnitProgress};
pub use error::{EngineError, EngineResult};
pub use pipeline::{load_pair, Comparator, ComparisonRequest, ComparisonResult, SideSummary};
pub use segment::{segment, segment_fixed, segment_pages, Segmentation};
