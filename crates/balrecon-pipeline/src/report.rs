//! End-to-end reconciliation run and its report.

use crate::classify::{ChannelGroup, Presence};
use crate::config::ReconConfig;
use crate::histogram::{Histogram, histograms};
use crate::ingest::read_snapshot;
use crate::ranking::{RankMetric, Ranking, rank_all};
use crate::reconcile::{ReconciledTable, Totals, reconcile};
use crate::summary::{Dimension, GroupSummary, summarize_by};
use balrecon_traits::{Date, Result, Snapshot, SnapshotSide};
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Facts about the two snapshots behind a report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReportMeta {
    /// Business date of the previous snapshot, when known
    pub previous_date: Option<Date>,
    /// Business date of the current snapshot, when known
    pub current_date: Option<Date>,
    /// Distinct clients in the previous snapshot
    pub previous_clients: usize,
    /// Distinct clients in the current snapshot
    pub current_clients: usize,
    /// Clients only in the current snapshot
    pub new_clients: usize,
    /// Clients only in the previous snapshot
    pub closed_clients: usize,
    /// Fee tier threshold applied
    pub fee_threshold: f64,
    /// Size of each ranking view
    pub top_n: usize,
}

/// Everything one reconciliation produces.
///
/// The raw table is skipped when serializing; renderers that need it read
/// [`Report::table`] directly.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Snapshot facts
    pub meta: ReportMeta,
    #[serde(skip)]
    table: ReconciledTable,
    /// Sums over every client
    pub totals: Totals,
    /// One summary per [`Dimension`], in [`Dimension::ALL`] order
    pub summaries: Vec<GroupSummary>,
    /// Top and bottom views, all clients first
    pub rankings: Vec<Ranking>,
    /// Change histograms, all clients first
    pub histograms: Vec<Histogram>,
}

impl Report {
    /// The per-client change table.
    pub const fn table(&self) -> &ReconciledTable {
        &self.table
    }

    /// Summary for one dimension.
    #[must_use]
    pub fn summary(&self, dimension: Dimension) -> Option<&GroupSummary> {
        self.summaries.iter().find(|s| s.dimension == dimension)
    }

    /// Ranking for one scope and metric. `None` if the group had no clients.
    #[must_use]
    pub fn ranking(&self, group: Option<ChannelGroup>, metric: RankMetric) -> Option<&Ranking> {
        self.rankings
            .iter()
            .find(|r| r.group == group && r.metric == metric)
    }

    /// Histogram for one scope. `None` if the group had no clients.
    #[must_use]
    pub fn histogram(&self, group: Option<ChannelGroup>) -> Option<&Histogram> {
        self.histograms.iter().find(|h| h.group == group)
    }
}

/// Runs the pipeline with one configuration.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    config: ReconConfig,
}

impl Reconciler {
    /// Creates a reconciler.
    pub const fn new(config: ReconConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub const fn config(&self) -> &ReconConfig {
        &self.config
    }

    /// Reconciles two loaded snapshots.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid, a snapshot is on the wrong
    /// side, or a snapshot lacks a required column.
    pub fn run(&self, previous: &Snapshot, current: &Snapshot) -> Result<Report> {
        self.config.validate()?;

        let table = reconcile(previous, current, &self.config.fee_tier)?;
        let totals = table.totals()?;

        let summaries = Dimension::ALL
            .into_iter()
            .map(|dimension| summarize_by(&table, dimension))
            .collect::<Result<Vec<_>>>()?;
        let rankings = rank_all(&table, self.config.ranking.top_n)?;
        let histograms = histograms(&table, &self.config.histogram.edges)?;

        let presence = summaries
            .iter()
            .find(|s| s.dimension == Dimension::Presence);
        let count = |p: Presence| {
            presence
                .and_then(|s| s.get(p.label()))
                .map_or(0, |row| row.totals.clients)
        };
        let both = count(Presence::Both);
        let new = count(Presence::New);
        let closed = count(Presence::Closed);

        let meta = ReportMeta {
            previous_date: previous.as_of(),
            current_date: current.as_of(),
            previous_clients: both + closed,
            current_clients: both + new,
            new_clients: new,
            closed_clients: closed,
            fee_threshold: self.config.fee_tier.threshold,
            top_n: self.config.ranking.top_n,
        };

        info!(
            clients = totals.clients,
            new = new,
            closed = closed,
            change = totals.change,
            "report ready"
        );

        Ok(Report {
            meta,
            table,
            totals,
            summaries,
            rankings,
            histograms,
        })
    }

    /// Reads both exports and reconciles them.
    ///
    /// Dates left as `None` are inferred from the file names.
    pub fn run_files(
        &self,
        previous: impl AsRef<Path>,
        current: impl AsRef<Path>,
        previous_date: Option<Date>,
        current_date: Option<Date>,
    ) -> Result<Report> {
        let previous =
            read_snapshot(previous, SnapshotSide::Previous, &self.config, previous_date)?;
        let current = read_snapshot(current, SnapshotSide::Current, &self.config, current_date)?;
        self.run(&previous, &current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::read_snapshot_from_reader;
    use approx::assert_relative_eq;
    use std::io::Write;

    const PREVIOUS: &str = "\
custcode|custname|salesid|currentbal|intrate
A|Alice|IPOT|100|18
A|Alice|IPOT|50|18
B|Bob|WM-01|200|12
C|Carol|RT2|75|
";

    const CURRENT: &str = "\
custcode|custname|salesid|currentbal|intrate
A|Alice|IPOT|175|18
B|Robert|WM-01|150|12
D|Dan|SALES9|40|20
";

    fn snapshots() -> (Snapshot, Snapshot) {
        let config = ReconConfig::default();
        let prev = read_snapshot_from_reader(
            PREVIOUS.as_bytes(),
            SnapshotSide::Previous,
            &config,
            Date::from_ymd_opt(2024, 1, 31),
        )
        .unwrap();
        let curr = read_snapshot_from_reader(
            CURRENT.as_bytes(),
            SnapshotSide::Current,
            &config,
            Date::from_ymd_opt(2024, 2, 29),
        )
        .unwrap();
        (prev, curr)
    }

    #[test]
    fn test_run_builds_every_section() {
        let (prev, curr) = snapshots();
        let report = Reconciler::default().run(&prev, &curr).unwrap();

        assert_eq!(report.table().len(), 4);
        assert_eq!(report.summaries.len(), Dimension::ALL.len());
        assert!(report.ranking(None, RankMetric::Change).is_some());
        assert!(report.histogram(None).is_some());
        assert!(report.histogram(Some(ChannelGroup::PrivateDealing)).is_some());

        assert_relative_eq!(report.totals.previous_balance, 425.0);
        assert_relative_eq!(report.totals.current_balance, 365.0);
        assert_relative_eq!(report.totals.change, -60.0);
    }

    #[test]
    fn test_meta_counts() {
        let (prev, curr) = snapshots();
        let report = Reconciler::default().run(&prev, &curr).unwrap();
        let meta = report.meta;

        assert_eq!(meta.previous_clients, 3);
        assert_eq!(meta.current_clients, 3);
        assert_eq!(meta.new_clients, 1);
        assert_eq!(meta.closed_clients, 1);
        assert_eq!(meta.previous_date, Date::from_ymd_opt(2024, 1, 31));
        assert_eq!(meta.top_n, 20);
    }

    #[test]
    fn test_report_serializes_without_table() {
        let (prev, curr) = snapshots();
        let report = Reconciler::default().run(&prev, &curr).unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert!(json.get("table").is_none());
        assert!(json.get("summaries").is_some());
        assert_eq!(json["meta"]["new_clients"], 1);
    }

    #[test]
    fn test_run_files_infers_dates() {
        let dir = tempfile::tempdir().unwrap();
        let prev_path = dir.path().join("balances_2024-01-31.txt");
        let curr_path = dir.path().join("balances_20240229.txt");
        std::fs::File::create(&prev_path)
            .unwrap()
            .write_all(PREVIOUS.as_bytes())
            .unwrap();
        std::fs::File::create(&curr_path)
            .unwrap()
            .write_all(CURRENT.as_bytes())
            .unwrap();

        let report = Reconciler::default()
            .run_files(&prev_path, &curr_path, None, None)
            .unwrap();
        assert_eq!(report.meta.previous_date, Date::from_ymd_opt(2024, 1, 31));
        assert_eq!(report.meta.current_date, Date::from_ymd_opt(2024, 2, 29));
    }

    #[test]
    fn test_unchanged_fractional_client_is_no_change() {
        let config = ReconConfig::default();
        let prev = read_snapshot_from_reader(
            "custcode|custname|salesid|currentbal\nA|x|IPOT|0.1\nA|x|IPOT|0.2\n".as_bytes(),
            SnapshotSide::Previous,
            &config,
            None,
        )
        .unwrap();
        let curr = read_snapshot_from_reader(
            "custcode|custname|salesid|currentbal\nA|x|IPOT|0.3\n".as_bytes(),
            SnapshotSide::Current,
            &config,
            None,
        )
        .unwrap();
        let report = Reconciler::new(config).run(&prev, &curr).unwrap();

        let overall = report.histogram(None).unwrap();
        assert_eq!(overall.buckets[0].clients, 1);
        assert_eq!(overall.buckets[1].clients, 0);
        assert!(overall.buckets.iter().all(|b| b.decreases == 0));
        assert_eq!(report.totals.change, 0.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let (prev, curr) = snapshots();
        let mut config = ReconConfig::default();
        config.ranking.top_n = 0;
        assert!(Reconciler::new(config).run(&prev, &curr).is_err());
    }
}
