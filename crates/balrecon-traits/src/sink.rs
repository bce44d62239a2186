//! Report sink trait for handing finished reports to a renderer.
//!
//! The pipeline never formats output itself. Anything that presents a
//! report (terminal tables, a downloadable CSV file, a JSON document, a web
//! page) implements [`ReportSink`] and receives the finished report.

use crate::Result;

/// A consumer of finished reconciliation reports.
///
/// The trait is generic over the report type so this crate does not depend
/// on the pipeline that produces it. Implementations should be `Send` so a
/// report can be rendered on a worker thread.
///
/// # Example
///
/// ```no_run
/// use balrecon_traits::{ReportSink, Result};
///
/// struct LineCounter {
///     lines: usize,
/// }
///
/// impl ReportSink<Vec<String>> for LineCounter {
///     fn name(&self) -> &str {
///         "line_counter"
///     }
///
///     fn render(&mut self, report: &Vec<String>) -> Result<()> {
///         self.lines += report.len();
///         Ok(())
///     }
/// }
/// ```
pub trait ReportSink<R: ?Sized>: Send {
    /// Short identifier used in log lines.
    fn name(&self) -> &str;

    /// Renders one report.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer fails or the report cannot
    /// be serialized into the sink's format.
    fn render(&mut self, report: &R) -> Result<()>;
}
