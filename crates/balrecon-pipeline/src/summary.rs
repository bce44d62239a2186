//! Grouped sum tables over the reconciled table.

use crate::classify::{ChannelGroup, FeeTier, Presence};
use crate::reconcile::{ReconciledTable, Totals};
use balrecon_traits::{ReconError, Result, columns};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

const CLIENTS: &str = "clients";

/// What a summary groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Channel group
    Channel,
    /// Fee tier
    FeeTier,
    /// Presence in the two snapshots
    Presence,
    /// Channel group crossed with fee tier
    ChannelAndTier,
}

impl Dimension {
    /// All dimensions in report order.
    pub const ALL: [Self; 4] = [
        Self::Channel,
        Self::FeeTier,
        Self::Presence,
        Self::ChannelAndTier,
    ];

    /// Columns grouped on.
    #[must_use]
    pub const fn key_columns(&self) -> &'static [&'static str] {
        match self {
            Self::Channel => &[columns::CHANNEL_GROUP],
            Self::FeeTier => &[columns::FEE_TIER],
            Self::Presence => &[columns::PRESENCE],
            Self::ChannelAndTier => &[columns::CHANNEL_GROUP, columns::FEE_TIER],
        }
    }

    /// Heading used by renderers.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Channel => "By channel",
            Self::FeeTier => "By fee tier",
            Self::Presence => "By presence",
            Self::ChannelAndTier => "By channel and fee tier",
        }
    }

    /// Canonical position of a group, from its key labels.
    fn order(&self, labels: &[String]) -> (usize, usize) {
        let channel = |label: &str| {
            ChannelGroup::ALL
                .iter()
                .position(|g| g.label() == label)
                .unwrap_or(usize::MAX)
        };
        let tier = |label: &str| {
            FeeTier::ALL
                .iter()
                .position(|t| t.label() == label)
                .unwrap_or(usize::MAX)
        };
        let first = labels.first().map(String::as_str).unwrap_or_default();
        let second = labels.get(1).map(String::as_str).unwrap_or_default();
        match self {
            Self::Channel => (channel(first), 0),
            Self::FeeTier => (tier(first), 0),
            Self::Presence => (
                Presence::ALL
                    .iter()
                    .position(|p| p.label() == first)
                    .unwrap_or(usize::MAX),
                0,
            ),
            Self::ChannelAndTier => (channel(first), tier(second)),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// One group of a summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRow {
    /// Group label; crossed dimensions are joined with ` / `
    pub label: String,
    /// Sums over the group's clients
    #[serde(flatten)]
    pub totals: Totals,
}

/// A grouped sum table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    /// What the rows are grouped by
    pub dimension: Dimension,
    /// Groups present in the table, in canonical order
    pub rows: Vec<GroupRow>,
    /// Sums over all groups
    pub total: Totals,
}

impl GroupSummary {
    /// Finds a group by label.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&GroupRow> {
        self.rows.iter().find(|row| row.label == label)
    }
}

/// Sums the reconciled table per group of `dimension`.
pub fn summarize_by(table: &ReconciledTable, dimension: Dimension) -> Result<GroupSummary> {
    let keys: Vec<Expr> = dimension.key_columns().iter().map(|c| col(*c)).collect();

    let grouped = table
        .data()
        .clone()
        .lazy()
        .group_by(keys)
        .agg([
            len().cast(DataType::Int64).alias(CLIENTS),
            col(columns::PREVIOUS_BALANCE).sum(),
            col(columns::CURRENT_BALANCE).sum(),
            col(columns::CHANGE).sum(),
        ])
        .collect()?;

    let mut labels: Vec<Vec<String>> = vec![Vec::new(); grouped.height()];
    for key in dimension.key_columns() {
        let values = grouped.column(key)?.as_materialized_series().str()?;
        for (i, value) in values.into_iter().enumerate() {
            labels[i].push(value.unwrap_or_default().to_string());
        }
    }

    let clients = grouped.column(CLIENTS)?.as_materialized_series().i64()?;
    let sums = |name: &str| -> Result<Vec<f64>> {
        Ok(grouped
            .column(name)?
            .as_materialized_series()
            .f64()?
            .into_iter()
            .map(|v| v.unwrap_or(0.0))
            .collect())
    };
    let previous = sums(columns::PREVIOUS_BALANCE)?;
    let current = sums(columns::CURRENT_BALANCE)?;
    let change = sums(columns::CHANGE)?;

    let mut ranked = Vec::with_capacity(grouped.height());
    for (i, key) in labels.into_iter().enumerate() {
        let count = clients.get(i).unwrap_or(0);
        let count = usize::try_from(count)
            .map_err(|_| ReconError::InvalidData(format!("negative group size {count}")))?;
        let order = dimension.order(&key);
        ranked.push((
            order,
            GroupRow {
                label: key.join(" / "),
                totals: Totals {
                    clients: count,
                    previous_balance: previous[i],
                    current_balance: current[i],
                    change: change[i],
                },
            },
        ));
    }
    ranked.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.label.cmp(&b.1.label)));

    Ok(GroupSummary {
        dimension,
        rows: ranked.into_iter().map(|(_, row)| row).collect(),
        total: table.totals()?,
    })
}

/// Channel summary.
pub fn summarize_by_channel(table: &ReconciledTable) -> Result<GroupSummary> {
    summarize_by(table, Dimension::Channel)
}

/// Fee tier summary.
pub fn summarize_by_fee_tier(table: &ReconciledTable) -> Result<GroupSummary> {
    summarize_by(table, Dimension::FeeTier)
}

/// Channel crossed with fee tier.
pub fn summarize_by_channel_and_tier(table: &ReconciledTable) -> Result<GroupSummary> {
    summarize_by(table, Dimension::ChannelAndTier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn table() -> ReconciledTable {
        let df = df! {
            "custcode" => &["A", "B", "C", "D", "E"],
            "custname" => &["Alice", "Bob", "Carol", "Dan", "Eve"],
            "salesid" => &["IPOT", "WM1", "IPOT", "RT2", "Z"],
            "channel_group" => &["IPOT", "WM", "IPOT", "Private Dealing", "Others"],
            "fee_tier" => &["Normal", "Special", "Special", "Normal", "Normal"],
            "presence" => &["both", "both", "new", "closed", "both"],
            "previous_balance" => &[100.0, 50.0, 0.0, 40.0, 5.0],
            "current_balance" => &[130.0, 80.0, 10.0, 0.0, 5.0],
            "change" => &[30.0, 30.0, 10.0, -40.0, 0.0],
        }
        .unwrap();
        ReconciledTable::new(df).unwrap()
    }

    #[test]
    fn test_channel_summary_order_and_sums() {
        let summary = summarize_by_channel(&table()).unwrap();
        let labels: Vec<&str> = summary.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["IPOT", "WM", "Private Dealing", "Others"]);

        let ipot = summary.get("IPOT").unwrap();
        assert_eq!(ipot.totals.clients, 2);
        assert_relative_eq!(ipot.totals.previous_balance, 100.0);
        assert_relative_eq!(ipot.totals.current_balance, 140.0);
        assert_relative_eq!(ipot.totals.change, 40.0);
    }

    #[test]
    fn test_groups_partition_totals() {
        let table = table();
        for dimension in Dimension::ALL {
            let summary = summarize_by(&table, dimension).unwrap();
            let clients: usize = summary.rows.iter().map(|r| r.totals.clients).sum();
            let change: f64 = summary.rows.iter().map(|r| r.totals.change).sum();
            assert_eq!(clients, summary.total.clients, "{dimension}");
            assert_relative_eq!(change, summary.total.change, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_fee_tier_summary() {
        let summary = summarize_by_fee_tier(&table()).unwrap();
        let labels: Vec<&str> = summary.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Normal", "Special"]);
        assert_eq!(summary.get("Special").unwrap().totals.clients, 2);
    }

    #[test]
    fn test_crossed_summary_labels() {
        let summary = summarize_by_channel_and_tier(&table()).unwrap();
        let labels: Vec<&str> = summary.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "IPOT / Normal",
                "IPOT / Special",
                "WM / Special",
                "Private Dealing / Normal",
                "Others / Normal"
            ]
        );
    }

    #[test]
    fn test_presence_summary() {
        let summary = summarize_by(&table(), Dimension::Presence).unwrap();
        let labels: Vec<&str> = summary.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["both", "new", "closed"]);
        assert_relative_eq!(summary.get("closed").unwrap().totals.change, -40.0);
    }
}
