//! Outer join of two aggregated snapshots into the per-client change table.

use crate::aggregate::aggregate_snapshot;
use crate::classify::{ChannelGroup, FeeTier, Presence, classify};
use crate::config::FeeTierConfig;
use balrecon_traits::{ClientCode, ReconError, Result, Snapshot, SnapshotSide, columns};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const PREV_SUFFIX: &str = "_prev";
const CURR_SUFFIX: &str = "_curr";
const IN_PREV: &str = "in_prev";
const IN_CURR: &str = "in_curr";
const CHANGE_DECIMALS: u32 = 2;

/// Label written in the name column of the totals row.
pub const TOTAL_LABEL: &str = "TOTAL";

/// One client of the reconciled table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRow {
    /// Client code
    pub custcode: ClientCode,
    /// Client name, preferring the current snapshot
    pub custname: Option<String>,
    /// Sales id, preferring the current snapshot
    pub salesid: Option<String>,
    /// Channel bucket
    pub channel_group: ChannelGroup,
    /// Fee tier
    pub fee_tier: FeeTier,
    /// Which snapshot(s) carried the client
    pub presence: Presence,
    /// Balance in the previous snapshot (0 when absent)
    pub previous_balance: f64,
    /// Balance in the current snapshot (0 when absent)
    pub current_balance: f64,
    /// `current_balance - previous_balance`, rounded to cents
    pub change: f64,
}

/// Column sums of a set of clients.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    /// Number of clients
    pub clients: usize,
    /// Sum of previous balances
    pub previous_balance: f64,
    /// Sum of current balances
    pub current_balance: f64,
    /// Sum of changes
    pub change: f64,
}

impl Totals {
    /// Adds one client.
    pub fn add(&mut self, row: &ClientRow) {
        self.clients += 1;
        self.previous_balance += row.previous_balance;
        self.current_balance += row.current_balance;
        self.change += row.change;
    }
}

impl<'a> FromIterator<&'a ClientRow> for Totals {
    fn from_iter<I: IntoIterator<Item = &'a ClientRow>>(iter: I) -> Self {
        let mut totals = Self::default();
        for row in iter {
            totals.add(row);
        }
        totals
    }
}

/// The per-client change table.
///
/// Columns follow [`columns::RECONCILED`]; rows are sorted by client code
/// and every client code of either snapshot appears exactly once.
#[derive(Debug, Clone)]
pub struct ReconciledTable {
    data: DataFrame,
}

impl ReconciledTable {
    /// Wraps a DataFrame, checking it carries the reconciled columns.
    pub fn new(data: DataFrame) -> Result<Self> {
        for name in columns::RECONCILED {
            if data.column(name).is_err() {
                return Err(ReconError::InvalidData(format!(
                    "reconciled table is missing column {name}"
                )));
            }
        }
        Ok(Self { data })
    }

    /// Returns a reference to the underlying DataFrame.
    pub const fn data(&self) -> &DataFrame {
        &self.data
    }

    /// Consumes self and returns the underlying DataFrame.
    pub fn into_inner(self) -> DataFrame {
        self.data
    }

    /// Number of clients.
    pub fn len(&self) -> usize {
        self.data.height()
    }

    /// Whether neither snapshot had any client.
    pub fn is_empty(&self) -> bool {
        self.data.height() == 0
    }

    /// Extracts the rows as typed records, in table order.
    pub fn rows(&self) -> Result<Vec<ClientRow>> {
        rows_of(&self.data)
    }

    /// Sums over every client.
    pub fn totals(&self) -> Result<Totals> {
        let sum = |name: &str| -> Result<f64> {
            Ok(self
                .data
                .column(name)?
                .as_materialized_series()
                .f64()?
                .sum()
                .unwrap_or(0.0))
        };
        Ok(Totals {
            clients: self.len(),
            previous_balance: sum(columns::PREVIOUS_BALANCE)?,
            current_balance: sum(columns::CURRENT_BALANCE)?,
            change: sum(columns::CHANGE)?,
        })
    }

    /// The table with a trailing `TOTAL` row, as offered for download.
    ///
    /// Text columns of the totals row are empty except the name column.
    pub fn with_totals_row(&self) -> Result<DataFrame> {
        let totals = self.totals()?;
        let total_row = df! {
            columns::CUSTCODE => &[""],
            columns::CUSTNAME => &[TOTAL_LABEL],
            columns::SALESID => &[""],
            columns::CHANNEL_GROUP => &[""],
            columns::FEE_TIER => &[""],
            columns::PRESENCE => &[""],
            columns::PREVIOUS_BALANCE => &[totals.previous_balance],
            columns::CURRENT_BALANCE => &[totals.current_balance],
            columns::CHANGE => &[totals.change],
        }?;

        let mut out = self.data.select(columns::RECONCILED)?;
        out.vstack_mut(&total_row)?;
        Ok(out)
    }
}

/// Reconciles two snapshots.
///
/// Both snapshots are aggregated per client, full-outer-joined on client
/// code and classified. Balances missing on one side count as zero; name,
/// sales id and interest rate prefer the current snapshot.
pub fn reconcile(
    previous: &Snapshot,
    current: &Snapshot,
    fee_tier: &FeeTierConfig,
) -> Result<ReconciledTable> {
    check_side(previous, SnapshotSide::Previous)?;
    check_side(current, SnapshotSide::Current)?;

    let prev = side_frame(aggregate_snapshot(previous)?, PREV_SUFFIX, IN_PREV);
    let curr = side_frame(aggregate_snapshot(current)?, CURR_SUFFIX, IN_CURR);

    let prev_code = format!("{}{PREV_SUFFIX}", columns::CUSTCODE);
    let curr_code = format!("{}{CURR_SUFFIX}", columns::CUSTCODE);
    let pick = |name: &str| -> Expr {
        col(format!("{name}{CURR_SUFFIX}"))
            .fill_null(col(format!("{name}{PREV_SUFFIX}")))
            .alias(name)
    };
    let balance = |suffix: &str, alias: &str| -> Expr {
        col(format!("{}{suffix}", columns::BALANCE))
            .fill_null(lit(0.0))
            .alias(alias)
    };

    let joined = prev
        .join(
            curr,
            [col(prev_code.as_str())],
            [col(curr_code.as_str())],
            JoinArgs::new(JoinType::Full),
        )
        .with_columns([
            col(IN_PREV).fill_null(lit(false)),
            col(IN_CURR).fill_null(lit(false)),
        ])
        .select([
            col(curr_code.as_str())
                .fill_null(col(prev_code.as_str()))
                .alias(columns::CUSTCODE),
            pick(columns::CUSTNAME),
            pick(columns::SALESID),
            pick(columns::INTRATE),
            when(col(IN_PREV).and(col(IN_CURR)))
                .then(lit(Presence::Both.label()))
                .when(col(IN_CURR))
                .then(lit(Presence::New.label()))
                .otherwise(lit(Presence::Closed.label()))
                .alias(columns::PRESENCE),
            balance(PREV_SUFFIX, columns::PREVIOUS_BALANCE),
            balance(CURR_SUFFIX, columns::CURRENT_BALANCE),
        ])
        .with_column(change_expr())
        .sort([columns::CUSTCODE], Default::default())
        .collect()?;

    debug!(clients = joined.height(), "joined snapshots");

    let classified = classify(joined, fee_tier)?;
    let table = ReconciledTable::new(classified.select(columns::RECONCILED)?)?;

    info!(
        previous_rows = previous.len(),
        current_rows = current.len(),
        clients = table.len(),
        "reconciled snapshots"
    );
    Ok(table)
}

/// `current - previous`, rounded to the exports' cent precision.
///
/// Balances are sums of fractional rows, so an unchanged client can come out
/// a few ulps off zero; rounding puts it back on exactly zero. Adding `0.0`
/// folds `-0.0` into `0.0`.
fn change_expr() -> Expr {
    ((col(columns::CURRENT_BALANCE) - col(columns::PREVIOUS_BALANCE)).round(CHANGE_DECIMALS)
        + lit(0.0))
    .alias(columns::CHANGE)
}

fn check_side(snapshot: &Snapshot, expected: SnapshotSide) -> Result<()> {
    if snapshot.side() == expected {
        Ok(())
    } else {
        Err(ReconError::InvalidData(format!(
            "expected the {expected} snapshot, got the {} one",
            snapshot.side()
        )))
    }
}

/// Suffixes every column of an aggregated snapshot and adds a presence marker.
fn side_frame(aggregated: DataFrame, suffix: &str, marker: &str) -> LazyFrame {
    let renamed: Vec<Expr> = columns::SNAPSHOT
        .iter()
        .map(|name| col(*name).alias(format!("{name}{suffix}")))
        .collect();
    aggregated
        .lazy()
        .select(renamed)
        .with_column(lit(true).alias(marker))
}

/// Reads typed rows out of a frame with the reconciled columns.
pub(crate) fn rows_of(df: &DataFrame) -> Result<Vec<ClientRow>> {
    let text = |name: &str| -> Result<Vec<Option<String>>> {
        Ok(df
            .column(name)?
            .as_materialized_series()
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect())
    };
    let numbers = |name: &str| -> Result<Vec<f64>> {
        Ok(df
            .column(name)?
            .as_materialized_series()
            .f64()?
            .into_iter()
            .map(|v| v.unwrap_or(0.0))
            .collect())
    };

    let codes = text(columns::CUSTCODE)?;
    let names = text(columns::CUSTNAME)?;
    let sales = text(columns::SALESID)?;
    let groups = text(columns::CHANNEL_GROUP)?;
    let tiers = text(columns::FEE_TIER)?;
    let presence = text(columns::PRESENCE)?;
    let previous = numbers(columns::PREVIOUS_BALANCE)?;
    let current = numbers(columns::CURRENT_BALANCE)?;
    let change = numbers(columns::CHANGE)?;

    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        rows.push(ClientRow {
            custcode: codes[i].clone().unwrap_or_default(),
            custname: names[i].clone(),
            salesid: sales[i].clone(),
            channel_group: groups[i]
                .as_deref()
                .and_then(ChannelGroup::from_label)
                .unwrap_or(ChannelGroup::Others),
            fee_tier: tiers[i]
                .as_deref()
                .and_then(FeeTier::from_label)
                .unwrap_or(FeeTier::Normal),
            presence: presence[i]
                .as_deref()
                .and_then(Presence::from_label)
                .unwrap_or(Presence::Both),
            previous_balance: previous[i],
            current_balance: current[i],
            change: change[i],
        });
    }
    Ok(rows)
}
