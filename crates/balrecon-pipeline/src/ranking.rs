//! Top and bottom client views.

use crate::classify::ChannelGroup;
use crate::reconcile::{ClientRow, ReconciledTable, rows_of};
use balrecon_traits::{ReconError, Result, columns};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Value clients are ranked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankMetric {
    /// Balance change between snapshots
    Change,
    /// Balance in the current snapshot
    CurrentBalance,
}

impl RankMetric {
    /// Both metrics in report order.
    pub const ALL: [Self; 2] = [Self::Change, Self::CurrentBalance];

    /// Column sorted on.
    #[must_use]
    pub const fn column(&self) -> &'static str {
        match self {
            Self::Change => columns::CHANGE,
            Self::CurrentBalance => columns::CURRENT_BALANCE,
        }
    }

    /// Heading fragment used by renderers.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Change => "change",
            Self::CurrentBalance => "current balance",
        }
    }

    /// Metric value of a row.
    #[must_use]
    pub const fn value(&self, row: &ClientRow) -> f64 {
        match self {
            Self::Change => row.change,
            Self::CurrentBalance => row.current_balance,
        }
    }
}

impl fmt::Display for RankMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Top and bottom clients of one scope by one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    /// Channel group ranked, `None` for all clients
    pub group: Option<ChannelGroup>,
    /// Value ranked on
    pub metric: RankMetric,
    /// Clients in scope
    pub clients: usize,
    /// Largest values, largest first
    pub top: Vec<ClientRow>,
    /// Smallest values, smallest first
    pub bottom: Vec<ClientRow>,
}

impl Ranking {
    /// `All` or the group label.
    #[must_use]
    pub fn scope(&self) -> &'static str {
        self.group.map_or("All", |g| g.label())
    }
}

/// Ranks one scope.
///
/// The scope is sorted once, descending by the metric with ties broken by
/// client code. `top` is the head of that order and `bottom` its tail, so the
/// two never share a client when the scope holds more than `2 * top_n`
/// clients. The tail is reordered smallest first, ties again by client code.
pub fn rank(
    table: &ReconciledTable,
    group: Option<ChannelGroup>,
    metric: RankMetric,
    top_n: usize,
) -> Result<Ranking> {
    if top_n == 0 {
        return Err(ReconError::InvalidData("top_n must be at least 1".into()));
    }

    let scoped = match group {
        Some(g) => {
            let mask = table
                .data()
                .column(columns::CHANNEL_GROUP)?
                .as_materialized_series()
                .str()?
                .into_iter()
                .map(|label: Option<&str>| label == Some(g.label()))
                .collect::<BooleanChunked>();
            table.data().filter(&mask)?
        }
        None => table.data().clone(),
    };

    // input is sorted by client code; a stable sort keeps that as tie-break
    let sorted = scoped.sort(
        [metric.column()],
        SortMultipleOptions::default()
            .with_order_descending(true)
            .with_maintain_order(true),
    )?;

    let top = rows_of(&sorted.head(Some(top_n)))?;
    let bottom = rows_of(
        &sorted
            .tail(Some(top_n))
            .sort([metric.column(), columns::CUSTCODE], Default::default())?,
    )?;

    debug!(
        scope = group.map_or("All", |g| g.label()),
        %metric,
        clients = sorted.height(),
        "ranked clients"
    );

    Ok(Ranking {
        group,
        metric,
        clients: sorted.height(),
        top,
        bottom,
    })
}

/// Rankings for all clients and for every channel group present, by both metrics.
pub fn rank_all(table: &ReconciledTable, top_n: usize) -> Result<Vec<Ranking>> {
    let scopes = std::iter::once(None).chain(ChannelGroup::ALL.into_iter().map(Some));

    let mut rankings = Vec::new();
    for group in scopes {
        for metric in RankMetric::ALL {
            let ranking = rank(table, group, metric, top_n)?;
            if group.is_some() && ranking.clients == 0 {
                continue;
            }
            rankings.push(ranking);
        }
    }
    Ok(rankings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn table(n: usize) -> ReconciledTable {
        let codes: Vec<String> = (0..n).map(|i| format!("C{i:03}")).collect();
        let names: Vec<String> = codes.iter().map(|c| format!("Client {c}")).collect();
        let sales: Vec<&str> = (0..n).map(|i| if i % 2 == 0 { "IPOT" } else { "WM1" }).collect();
        let groups: Vec<&str> = (0..n).map(|i| if i % 2 == 0 { "IPOT" } else { "WM" }).collect();
        let tiers: Vec<&str> = vec!["Normal"; n];
        let presence: Vec<&str> = vec!["both"; n];
        let previous: Vec<f64> = (0..n).map(|i| (i * 10) as f64).collect();
        let current: Vec<f64> = (0..n).map(|i| ((n - i) * 7) as f64).collect();
        let change: Vec<f64> = previous.iter().zip(&current).map(|(p, c)| c - p).collect();

        let df = df! {
            "custcode" => codes,
            "custname" => names,
            "salesid" => sales,
            "channel_group" => groups,
            "fee_tier" => tiers,
            "presence" => presence,
            "previous_balance" => previous,
            "current_balance" => current,
            "change" => change,
        }
        .unwrap();
        ReconciledTable::new(df).unwrap()
    }

    #[test]
    fn test_top_and_bottom_order() {
        let ranking = rank(&table(10), None, RankMetric::Change, 3).unwrap();
        assert_eq!(ranking.clients, 10);
        assert_eq!(ranking.top.len(), 3);
        assert_eq!(ranking.bottom.len(), 3);

        let top: Vec<f64> = ranking.top.iter().map(|r| r.change).collect();
        assert!(top.windows(2).all(|w| w[0] >= w[1]));
        let bottom: Vec<f64> = ranking.bottom.iter().map(|r| r.change).collect();
        assert!(bottom.windows(2).all(|w| w[0] <= w[1]));

        assert_eq!(ranking.top[0].custcode, "C000");
        assert_eq!(ranking.bottom[0].custcode, "C009");
    }

    #[test]
    fn test_disjoint_when_large_enough() {
        let ranking = rank(&table(50), None, RankMetric::CurrentBalance, 20).unwrap();
        let top: HashSet<&str> = ranking.top.iter().map(|r| r.custcode.as_str()).collect();
        let bottom: HashSet<&str> = ranking.bottom.iter().map(|r| r.custcode.as_str()).collect();
        assert!(top.is_disjoint(&bottom));
    }

    #[test]
    fn test_small_group_overlaps() {
        let ranking = rank(&table(5), None, RankMetric::Change, 20).unwrap();
        assert_eq!(ranking.top.len(), 5);
        assert_eq!(ranking.bottom.len(), 5);
    }

    #[test]
    fn test_group_scope() {
        let ranking = rank(&table(10), Some(ChannelGroup::Wm), RankMetric::Change, 20).unwrap();
        assert_eq!(ranking.clients, 5);
        assert!(ranking.top.iter().all(|r| r.channel_group == ChannelGroup::Wm));
        assert_eq!(ranking.scope(), "WM");
    }

    #[test]
    fn test_ties_broken_by_client_code() {
        let df = df! {
            "custcode" => &["A", "B", "C"],
            "custname" => &["a", "b", "c"],
            "salesid" => &["IPOT", "IPOT", "IPOT"],
            "channel_group" => &["IPOT", "IPOT", "IPOT"],
            "fee_tier" => &["Normal", "Normal", "Normal"],
            "presence" => &["both", "both", "both"],
            "previous_balance" => &[0.0, 0.0, 0.0],
            "current_balance" => &[1.0, 1.0, 1.0],
            "change" => &[1.0, 1.0, 1.0],
        }
        .unwrap();
        let table = ReconciledTable::new(df).unwrap();
        let ranking = rank(&table, None, RankMetric::Change, 2).unwrap();
        let top: Vec<&str> = ranking.top.iter().map(|r| r.custcode.as_str()).collect();
        assert_eq!(top, vec!["A", "B"]);
    }

    #[test]
    fn test_bottom_ties_ascend_by_client_code() {
        let df = df! {
            "custcode" => &["A", "B", "C", "D", "E"],
            "custname" => &["a", "b", "c", "d", "e"],
            "salesid" => &["IPOT"; 5],
            "channel_group" => &["IPOT"; 5],
            "fee_tier" => &["Normal"; 5],
            "presence" => &["both"; 5],
            "previous_balance" => &[0.0; 5],
            "current_balance" => &[5.0, 1.0, 1.0, 1.0, 1.0],
            "change" => &[5.0, 1.0, 1.0, 1.0, 1.0],
        }
        .unwrap();
        let table = ReconciledTable::new(df).unwrap();
        let ranking = rank(&table, None, RankMetric::Change, 2).unwrap();

        let top: Vec<&str> = ranking.top.iter().map(|r| r.custcode.as_str()).collect();
        let bottom: Vec<&str> = ranking.bottom.iter().map(|r| r.custcode.as_str()).collect();
        assert_eq!(top, vec!["A", "B"]);
        assert_eq!(bottom, vec!["D", "E"]);
    }

    #[test]
    fn test_rank_all_skips_empty_groups() {
        let rankings = rank_all(&table(6), 2).unwrap();
        // All + IPOT + WM, two metrics each
        assert_eq!(rankings.len(), 6);
        assert_eq!(rankings[0].scope(), "All");
        assert!(rankings.iter().all(|r| r.group != Some(ChannelGroup::Others)));
    }

    #[test]
    fn test_zero_top_n_rejected() {
        assert!(rank(&table(3), None, RankMetric::Change, 0).is_err());
    }
}
