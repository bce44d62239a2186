//! JSON document of the report.

use balrecon_pipeline::Report;
use balrecon_traits::{ReconError, ReportSink, Result};
use std::io::Write;
use tracing::debug;

/// Pretty-printed JSON of the serializable report.
///
/// The per-client table is not included; pair with [`crate::CsvSink`] for it.
#[derive(Debug)]
pub struct JsonSink<W> {
    writer: W,
}

impl<W: Write> JsonSink<W> {
    /// Creates a sink over any writer.
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> ReportSink<Report> for JsonSink<W> {
    fn name(&self) -> &str {
        "json"
    }

    fn render(&mut self, report: &Report) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, report)
            .map_err(|e| ReconError::Serialization(e.to_string()))?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        debug!("json report written");
        Ok(())
    }
}
