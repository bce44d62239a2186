//! Downloadable per-client table.

use balrecon_pipeline::Report;
use balrecon_traits::{ReportSink, Result};
use polars::prelude::*;
use std::io::Write;
use tracing::debug;

/// Default file name of the downloadable table.
pub const DEFAULT_FILE_NAME: &str = "balance_changes.csv";

/// Writes the reconciled table with its `TOTAL` row as comma separated values.
///
/// Amounts are raw numbers; rows keep the table's client code order, so the
/// same inputs always produce the same bytes.
#[derive(Debug)]
pub struct CsvSink<W> {
    writer: W,
}

impl<W: Write> CsvSink<W> {
    /// Creates a sink over any writer.
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> ReportSink<Report> for CsvSink<W> {
    fn name(&self) -> &str {
        "csv"
    }

    fn render(&mut self, report: &Report) -> Result<()> {
        let mut df = report.table().with_totals_row()?;
        CsvWriter::new(&mut self.writer)
            .include_header(true)
            .with_separator(b',')
            .finish(&mut df)?;
        self.writer.flush()?;
        debug!(rows = df.height(), "csv table written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::sample_report;
    use balrecon_pipeline::TOTAL_LABEL;

    fn render() -> String {
        let mut sink = CsvSink::new(Vec::new());
        sink.render(&sample_report()).unwrap();
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn test_header_and_total_row() {
        let text = render();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "custcode,custname,salesid,channel_group,fee_tier,presence,previous_balance,current_balance,change"
        );
        // four clients then the totals row
        assert_eq!(lines.len(), 6);
        assert!(lines[5].contains(TOTAL_LABEL));
        assert!(lines[1].starts_with("A,"));
        assert!(lines[4].starts_with("D,"));
    }

    #[test]
    fn test_raw_numbers() {
        let text = render();
        assert!(!text.contains("(75)"));
        assert!(text.contains("-75"));
    }

    #[test]
    fn test_identical_bytes() {
        assert_eq!(render(), render());
    }

    #[test]
    fn test_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_FILE_NAME);
        let file = std::fs::File::create(&path).unwrap();
        CsvSink::new(file).render(&sample_report()).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("custcode,"));
    }
}
