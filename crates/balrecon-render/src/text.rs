//! Plain-text report for terminals.

use crate::format::{accounting_format, signed_count};
use balrecon_pipeline::{
    ClientRow, GroupSummary, Histogram, Ranking, ReconciledTable, Report, ReportMeta,
    TOTAL_LABEL, Totals,
};
use balrecon_traits::{ReportSink, Result};
use std::io::Write;
use tracing::debug;

const RULE: &str = "══════════════════════════════════════════════════════════════";

#[derive(Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
}

/// Writes rows under a header with every column padded to its widest cell.
fn write_grid<W: Write + ?Sized>(
    w: &mut W,
    headers: &[&str],
    align: &[Align],
    rows: &[Vec<String>],
) -> Result<()> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .zip(align)
            .map(|((cell, &width), align)| match align {
                Align::Left => format!("{cell:<width$}"),
                Align::Right => format!("{cell:>width$}"),
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let header: Vec<String> = headers.iter().map(|h| (*h).to_string()).collect();
    writeln!(w, "  {}", line(&header))?;
    let total_width = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    writeln!(w, "  {}", "─".repeat(total_width))?;
    for row in rows {
        writeln!(w, "  {}", line(row))?;
    }
    Ok(())
}

fn amounts(totals: &Totals) -> [String; 3] {
    [
        accounting_format(Some(totals.previous_balance)),
        accounting_format(Some(totals.current_balance)),
        accounting_format(Some(totals.change)),
    ]
}

fn date_or_unknown(meta_date: Option<balrecon_traits::Date>) -> String {
    meta_date.map_or_else(|| "unknown date".to_string(), |d| d.to_string())
}

/// Writes the boxed title and the snapshot facts.
pub fn write_header<W: Write + ?Sized>(w: &mut W, meta: &ReportMeta) -> Result<()> {
    writeln!(w, "\n╔{RULE}╗")?;
    writeln!(w, "║                    Balance Reconciliation                    ║")?;
    writeln!(w, "╚{RULE}╝\n")?;

    writeln!(
        w,
        "Previous:  {} ({} clients)",
        date_or_unknown(meta.previous_date),
        meta.previous_clients
    )?;
    writeln!(
        w,
        "Current:   {} ({} clients)",
        date_or_unknown(meta.current_date),
        meta.current_clients
    )?;
    writeln!(w, "New:       {}", meta.new_clients)?;
    writeln!(w, "Closed:    {}", meta.closed_clients)?;

    let net = i64::try_from(meta.current_clients).unwrap_or(i64::MAX)
        - i64::try_from(meta.previous_clients).unwrap_or(i64::MAX);
    writeln!(w, "Net:       {}", signed_count(net))?;
    writeln!(w, "Fee tier:  Special below {} interest", meta.fee_threshold)?;
    Ok(())
}

/// Writes the per-client table followed by its `TOTAL` row.
pub fn write_table<W: Write + ?Sized>(w: &mut W, table: &ReconciledTable) -> Result<()> {
    let rows = table.rows()?;
    let totals: Totals = rows.iter().collect();

    let mut cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let [previous, current, change] = amounts(&Totals::from_iter([row]));
            vec![
                row.custcode.clone(),
                row.custname.clone().unwrap_or_default(),
                row.salesid.clone().unwrap_or_default(),
                row.channel_group.to_string(),
                row.fee_tier.to_string(),
                row.presence.to_string(),
                previous,
                current,
                change,
            ]
        })
        .collect();

    let [previous, current, change] = amounts(&totals);
    cells.push(vec![
        String::new(),
        TOTAL_LABEL.to_string(),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
        previous,
        current,
        change,
    ]);

    writeln!(w, "\nClients\n")?;
    write_grid(
        w,
        &[
            "Code", "Name", "Sales ID", "Channel", "Tier", "Presence", "Previous", "Current",
            "Change",
        ],
        &[
            Align::Left,
            Align::Left,
            Align::Left,
            Align::Left,
            Align::Left,
            Align::Left,
            Align::Right,
            Align::Right,
            Align::Right,
        ],
        &cells,
    )
}

/// Writes one grouped sum table with a total line.
pub fn write_summary<W: Write + ?Sized>(w: &mut W, summary: &GroupSummary) -> Result<()> {
    let line = |label: &str, totals: &Totals| -> Vec<String> {
        let [previous, current, change] = amounts(totals);
        vec![
            label.to_string(),
            totals.clients.to_string(),
            previous,
            current,
            change,
        ]
    };

    let mut cells: Vec<Vec<String>> = summary
        .rows
        .iter()
        .map(|row| line(&row.label, &row.totals))
        .collect();
    cells.push(line("Total", &summary.total));

    writeln!(w, "\n{}\n", summary.dimension.title())?;
    write_grid(
        w,
        &["Group", "Clients", "Previous", "Current", "Change"],
        &[
            Align::Left,
            Align::Right,
            Align::Right,
            Align::Right,
            Align::Right,
        ],
        &cells,
    )
}

fn ranking_cells(rows: &[ClientRow]) -> Vec<Vec<String>> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            vec![
                (i + 1).to_string(),
                row.custcode.clone(),
                row.custname.clone().unwrap_or_default(),
                row.channel_group.to_string(),
                accounting_format(Some(row.current_balance)),
                accounting_format(Some(row.change)),
            ]
        })
        .collect()
}

/// Writes the top and bottom views of one ranking.
pub fn write_ranking<W: Write + ?Sized>(w: &mut W, ranking: &Ranking) -> Result<()> {
    let headers = ["#", "Code", "Name", "Channel", "Current", "Change"];
    let align = [
        Align::Right,
        Align::Left,
        Align::Left,
        Align::Left,
        Align::Right,
        Align::Right,
    ];

    writeln!(
        w,
        "\nTop {} by {} ({}, {} clients)\n",
        ranking.top.len(),
        ranking.metric,
        ranking.scope(),
        ranking.clients
    )?;
    write_grid(w, &headers, &align, &ranking_cells(&ranking.top))?;

    writeln!(
        w,
        "\nBottom {} by {} ({}, {} clients)\n",
        ranking.bottom.len(),
        ranking.metric,
        ranking.scope(),
        ranking.clients
    )?;
    write_grid(w, &headers, &align, &ranking_cells(&ranking.bottom))
}

/// Writes one change histogram.
pub fn write_histogram<W: Write + ?Sized>(w: &mut W, histogram: &Histogram) -> Result<()> {
    let cells: Vec<Vec<String>> = histogram
        .buckets
        .iter()
        .map(|b| {
            vec![
                b.label.clone(),
                b.increases.to_string(),
                b.decreases.to_string(),
                b.clients.to_string(),
                accounting_format(Some(b.net_change)),
            ]
        })
        .collect();

    writeln!(
        w,
        "\nChange distribution ({}, {} clients)\n",
        histogram.scope(),
        histogram.clients()
    )?;
    write_grid(
        w,
        &["|Change|", "Up", "Down", "Clients", "Net change"],
        &[
            Align::Left,
            Align::Right,
            Align::Right,
            Align::Right,
            Align::Right,
        ],
        &cells,
    )
}

/// Renders the whole report as aligned text tables.
#[derive(Debug)]
pub struct TextSink<W> {
    writer: W,
    show_table: bool,
}

impl<W: Write> TextSink<W> {
    /// Creates a sink that writes every section.
    pub const fn new(writer: W) -> Self {
        Self {
            writer,
            show_table: true,
        }
    }

    /// Leaves out the per-client table, which can run to thousands of lines.
    #[must_use]
    pub const fn with_table(mut self, show: bool) -> Self {
        self.show_table = show;
        self
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> ReportSink<Report> for TextSink<W> {
    fn name(&self) -> &str {
        "text"
    }

    fn render(&mut self, report: &Report) -> Result<()> {
        let w = &mut self.writer;
        write_header(w, &report.meta)?;

        if self.show_table {
            write_table(w, report.table())?;
        }
        for summary in &report.summaries {
            write_summary(w, summary)?;
        }
        for ranking in &report.rankings {
            write_ranking(w, ranking)?;
        }
        for histogram in &report.histograms {
            write_histogram(w, histogram)?;
        }

        w.flush()?;
        debug!(sink = self.name(), "text report written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::sample_report;

    fn render(sink: TextSink<Vec<u8>>) -> String {
        let mut sink = sink;
        sink.render(&sample_report()).unwrap();
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn test_full_report_sections() {
        let text = render(TextSink::new(Vec::new()));
        assert!(text.contains("Balance Reconciliation"));
        assert!(text.contains("Clients\n"));
        assert!(text.contains(TOTAL_LABEL));
        assert!(text.contains("By channel"));
        assert!(text.contains("By fee tier"));
        assert!(text.contains("Top "));
        assert!(text.contains("Bottom "));
        assert!(text.contains("Change distribution (All"));
        assert!(text.contains("no change"));
    }

    #[test]
    fn test_table_can_be_hidden() {
        let text = render(TextSink::new(Vec::new()).with_table(false));
        assert!(!text.contains("Clients\n"));
        assert!(text.contains("By channel"));
    }

    #[test]
    fn test_negative_amounts_in_parentheses() {
        let text = render(TextSink::new(Vec::new()));
        // Closed client C drops 75
        assert!(text.contains("(75)"));
    }

    #[test]
    fn test_header_dates() {
        let mut out = Vec::new();
        write_header(&mut out, &sample_report().meta).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Previous:  2024-01-31 (3 clients)"));
        assert!(text.contains("Net:       0"));
    }

    #[test]
    fn test_grid_alignment() {
        let mut out = Vec::new();
        write_grid(
            &mut out,
            &["A", "B"],
            &[Align::Left, Align::Right],
            &[vec!["xx".into(), "1".into()], vec!["y".into(), "100".into()]],
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "  A     B");
        assert_eq!(lines[2], "  xx    1");
        assert_eq!(lines[3], "  y   100");
    }
}
