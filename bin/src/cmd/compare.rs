//! Compare command implementation.

use super::Context;
use anyhow::{Context as _, Result};
use balrecon::render::{CsvSink, JsonSink, TextSink};
use balrecon::{Report, ReportSink};
use std::fs::File;
use std::io::{BufWriter, stdout};
use std::path::{Path, PathBuf};
use tracing::info;

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Run the full reconciliation and render it to every requested sink.
pub(crate) fn run(
    ctx: &Context,
    previous: &Path,
    current: &Path,
    csv: Option<PathBuf>,
    json: Option<PathBuf>,
    no_table: bool,
) -> Result<()> {
    let report = ctx.report(previous, current)?;

    let text: Box<dyn ReportSink<Report>> =
        Box::new(TextSink::new(BufWriter::new(stdout())).with_table(!no_table));
    let mut sinks = vec![(None, text)];

    if let Some(path) = csv {
        let sink: Box<dyn ReportSink<Report>> = Box::new(CsvSink::new(create(&path)?));
        sinks.push((Some(path), sink));
    }
    if let Some(path) = json {
        let sink: Box<dyn ReportSink<Report>> = Box::new(JsonSink::new(create(&path)?));
        sinks.push((Some(path), sink));
    }

    for (path, sink) in &mut sinks {
        sink.render(&report)
            .with_context(|| format!("rendering {} output", sink.name()))?;
        if let Some(path) = path {
            info!(sink = sink.name(), path = %path.display(), "report written");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::tests::{context, write_exports};
    use balrecon::render::DEFAULT_FILE_NAME;

    #[test]
    fn test_writes_csv_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let (previous, current) = write_exports(dir.path());
        let csv = dir.path().join(DEFAULT_FILE_NAME);
        let json = dir.path().join("report.json");

        run(
            &context(),
            &previous,
            &current,
            Some(csv.clone()),
            Some(json.clone()),
            true,
        )
        .unwrap();

        let table = std::fs::read_to_string(&csv).unwrap();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(
            lines[0],
            "custcode,custname,salesid,channel_group,fee_tier,presence,previous_balance,current_balance,change"
        );
        assert_eq!(lines.len(), 6);
        assert!(lines[1].starts_with("A,Alice,IPOT,IPOT,"));
        assert!(lines[5].contains(",TOTAL,"));

        let report = std::fs::read_to_string(&json).unwrap();
        assert!(report.contains("\"previous_date\": \"2024-01-31\""));
        assert!(report.contains("\"new_clients\": 1"));
    }

    #[test]
    fn test_missing_export_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (previous, _) = write_exports(dir.path());
        let csv = dir.path().join(DEFAULT_FILE_NAME);
        let missing = dir.path().join("absent.txt");

        let result = run(&context(), &previous, &missing, Some(csv.clone()), None, true);
        assert!(result.is_err());
        assert!(!csv.exists());
    }
}
