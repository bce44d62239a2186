#![doc(issue_tracker_base_url = "https://github.com/factordynamics/balrecon/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core types for the balrecon reconciliation pipeline.
//!
//! This crate holds the pieces every other balrecon crate agrees on: the
//! normalised [`Snapshot`] container, canonical column names, the error type
//! and the [`ReportSink`] seam through which renderers receive reports.

/// The version of the balrecon-traits crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Module declarations
pub mod error;
pub mod sink;
pub mod types;

// Re-exports
pub use error::{ReconError, Result};
pub use sink::ReportSink;
pub use types::{ClientCode, Date, Snapshot, SnapshotSide, columns};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }
}
