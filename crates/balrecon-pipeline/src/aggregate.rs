//! Per-client aggregation of a single snapshot.

use balrecon_traits::{Result, Snapshot, columns};
use polars::prelude::*;
use tracing::debug;

/// Collapses a snapshot to one row per client code.
///
/// Name, sales id and interest rate take the first non-null value in file
/// order; balances are summed with nulls ignored, so a client whose rows all
/// lack a balance aggregates to zero. Output is sorted by client code.
pub fn aggregate_snapshot(snapshot: &Snapshot) -> Result<DataFrame> {
    let aggregated = snapshot
        .data()
        .clone()
        .lazy()
        .group_by_stable([col(columns::CUSTCODE)])
        .agg([
            col(columns::CUSTNAME).drop_nulls().first(),
            col(columns::SALESID).drop_nulls().first(),
            col(columns::INTRATE).drop_nulls().first(),
            col(columns::BALANCE).sum(),
        ])
        .sort([columns::CUSTCODE], Default::default())
        .collect()?;

    debug!(
        side = %snapshot.side(),
        rows = snapshot.len(),
        clients = aggregated.height(),
        "aggregated snapshot"
    );
    Ok(aggregated)
}
