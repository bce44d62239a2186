#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/balrecon/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! # balrecon
//!
//! Client balance reconciliation.
//!
//! balrecon is an umbrella crate that re-exports the balrecon sub-crates for
//! convenience: core types, the reconciliation pipeline and the report sinks.
//!
//! ## Quick Start
//!
//! ```ignore
//! use balrecon::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let reconciler = Reconciler::new(ReconConfig::default());
//! let report = reconciler.run_files("bal_20240131.txt", "bal_20240229.txt", None, None)?;
//!
//! let mut sink = TextSink::new(std::io::stdout());
//! sink.render(&report)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Organization
//!
//! - [`traits`] - Core types ([`Snapshot`], [`ReconError`], [`ReportSink`])
//! - [`pipeline`] - Ingestion, reconciliation, summaries, rankings, histograms
//! - [`render`] - Text, CSV and JSON sinks
//!
//! ## Architecture
//!
//! 1. **Ingest** each export into a normalised snapshot
//! 2. **Reconcile** the two snapshots into one row per client
//! 3. **Derive** summaries, rankings and histograms into a [`Report`]
//! 4. **Render** the report through any number of sinks

/// Version information for the balrecon crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core types shared by every balrecon crate.
pub mod traits {
    pub use balrecon_traits::*;
}

/// The reconciliation pipeline.
///
/// ```ignore
/// use balrecon::pipeline::{ChannelGroup, RankMetric, rank};
///
/// let wm_movers = rank(report.table(), Some(ChannelGroup::Wm), RankMetric::Change, 10)?;
/// ```
pub mod pipeline {
    pub use balrecon_pipeline::*;
}

/// Report sinks.
pub mod render {
    pub use balrecon_render::*;
}

// Re-export the types most callers need at the top level
pub use balrecon_pipeline::{ReconConfig, Reconciler, Report};
pub use balrecon_traits::{Date, ReconError, ReportSink, Result, Snapshot, SnapshotSide};

/// Prelude module for convenient imports.
///
/// ```ignore
/// use balrecon::prelude::*;
/// ```
pub mod prelude {
    pub use crate::pipeline::{
        ChannelGroup, Dimension, FeeTier, Presence, RankMetric, ReconConfig, Reconciler, Report,
    };
    pub use crate::render::{CsvSink, JsonSink, TextSink};
    pub use crate::{ReconError, ReportSink, Result, Snapshot, SnapshotSide};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        let parts: Vec<&str> = VERSION.split('.').collect();
        assert!(parts.len() >= 2, "Version should have at least major.minor");
    }

    #[test]
    fn test_re_exports() {
        fn _accept_sink(_sink: &dyn ReportSink<Report>) {}

        let sink = render::CsvSink::new(Vec::<u8>::new());
        let _config: ReconConfig = pipeline::ReconConfig::default();
        _accept_sink(&sink);
    }

    #[test]
    fn test_error_types() {
        let _result: Result<()> = Ok(());
        let error: ReconError = ReconError::InvalidData("test".to_string());
        assert!(error.to_string().contains("test"));
    }
}
