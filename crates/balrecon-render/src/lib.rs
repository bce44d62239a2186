#![doc(issue_tracker_base_url = "https://github.com/factordynamics/balrecon/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Report sinks for balrecon.
//!
//! Each sink implements [`ReportSink`] for the pipeline's [`Report`]:
//!
//! - [`TextSink`]: aligned tables for a terminal, amounts in accounting format
//! - [`CsvSink`]: the downloadable per-client table with its `TOTAL` row
//! - [`JsonSink`]: the serializable report for other tools
//!
//! [`ReportSink`]: balrecon_traits::ReportSink
//! [`Report`]: balrecon_pipeline::Report

pub mod csv;
pub mod format;
pub mod json;
pub mod text;

pub use csv::{CsvSink, DEFAULT_FILE_NAME};
pub use format::accounting_format;
pub use json::JsonSink;
pub use text::{
    TextSink, write_header, write_histogram, write_ranking, write_summary, write_table,
};
