#![doc(issue_tracker_base_url = "https://github.com/factordynamics/malaga/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core types and trait definitions for the Malaga framework.
//!
//! This crate provides the foundational abstractions shared by the labeler,
//! the scorers, the portfolio simulator and the data adapters: feature rows,
//! snapshots, feature matrices, and the `Scorer`, `FeatureProvider`,
//! `SnapshotSource` and `ResultWriter` seams.

/// The version of the malaga-traits crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Module declarations
pub mod error;
pub mod matrix;
pub mod provider;
pub mod report;
pub mod scorer;
pub mod snapshot;
pub mod stats;
pub mod types;

// Re-exports
pub use error::{MalagaError, Result};
pub use matrix::{FeatureMatrix, FeatureSchema};
pub use provider::{DateRange, FeatureGap, FeatureProvider, FeatureSet, InstrumentFetch};
pub use report::{EquityPoint, ResultWriter, StepStatus, TopPick};
pub use scorer::{Scorer, TrainedModel};
pub use snapshot::{Snapshot, SnapshotBook, SnapshotSource};
pub use types::{Date, FeatureRow, LabeledRow, NewsRow, RET_1, RET_21, SENTIMENT, Score, Symbol};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }
}
