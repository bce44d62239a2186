#![doc(issue_tracker_base_url = "https://github.com/factordynamics/balrecon/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Reconciliation pipeline for balrecon.
//!
//! Two dated balance exports go in, a [`Report`] comes out:
//!
//! 1. **Ingest** reads a delimited export into a normalised [`Snapshot`]
//! 2. **Aggregate** collapses each snapshot to one row per client
//! 3. **Reconcile** outer-joins the two aggregates and computes the change
//! 4. **Classify** assigns a channel group and a fee tier to every client
//! 5. **Summaries, rankings and histograms** are derived from that table
//!
//! # Example
//!
//! ```rust,ignore
//! use balrecon_pipeline::{ReconConfig, Reconciler};
//!
//! let reconciler = Reconciler::new(ReconConfig::default());
//! let report = reconciler.run_files("bal_20240131.txt", "bal_20240229.txt", None, None)?;
//! println!("net change: {}", report.totals.change);
//! ```
//!
//! [`Snapshot`]: balrecon_traits::Snapshot

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod histogram;
pub mod ingest;
pub mod ranking;
pub mod reconcile;
pub mod report;
pub mod summary;

// Re-export main types
pub use aggregate::aggregate_snapshot;
pub use classify::{ChannelGroup, FeeTier, Presence};
pub use config::{ColumnMapping, FeeTierConfig, HistogramConfig, RankingConfig, ReconConfig};
pub use histogram::{Bucket, Histogram, change_histogram, histograms};
pub use ingest::{
    infer_snapshot_date, parse_amount, parse_snapshot_date, read_snapshot, read_snapshot_from_reader,
};
pub use ranking::{RankMetric, Ranking, rank, rank_all};
pub use reconcile::{ClientRow, ReconciledTable, TOTAL_LABEL, Totals, reconcile};
pub use report::{Reconciler, Report, ReportMeta};
pub use summary::{
    Dimension, GroupRow, GroupSummary, summarize_by, summarize_by_channel,
    summarize_by_channel_and_tier, summarize_by_fee_tier,
};
