//! Bucketed distribution of change magnitudes.

use crate::classify::ChannelGroup;
use crate::reconcile::{ClientRow, ReconciledTable};
use balrecon_traits::{ReconError, Result};
use num_format::{Locale, ToFormattedString};
use serde::{Deserialize, Serialize};

/// One magnitude bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    /// Display label such as `1,000 - 10,000`
    pub label: String,
    /// Exclusive lower bound of `|change|` (0 for the no-change bucket)
    pub lower: f64,
    /// Inclusive upper bound, `None` for the open-ended last bucket
    pub upper: Option<f64>,
    /// Clients whose balance went up
    pub increases: usize,
    /// Clients whose balance went down
    pub decreases: usize,
    /// All clients in the bucket
    pub clients: usize,
    /// Sum of signed changes
    pub net_change: f64,
}

impl Bucket {
    fn new(label: String, lower: f64, upper: Option<f64>) -> Self {
        Self {
            label,
            lower,
            upper,
            increases: 0,
            decreases: 0,
            clients: 0,
            net_change: 0.0,
        }
    }

    fn add(&mut self, change: f64) {
        self.clients += 1;
        self.net_change += change;
        if change > 0.0 {
            self.increases += 1;
        } else if change < 0.0 {
            self.decreases += 1;
        }
    }
}

/// Change histogram of one scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// Channel group, `None` for all clients
    pub group: Option<ChannelGroup>,
    /// Buckets from no change upward; always `edges.len() + 2` of them
    pub buckets: Vec<Bucket>,
}

impl Histogram {
    /// `All` or the group label.
    #[must_use]
    pub fn scope(&self) -> &'static str {
        self.group.map_or("All", |g| g.label())
    }

    /// Clients across all buckets.
    #[must_use]
    pub fn clients(&self) -> usize {
        self.buckets.iter().map(|b| b.clients).sum()
    }
}

fn thousands(value: f64) -> String {
    (value.round() as i64).to_formatted_string(&Locale::en)
}

fn empty_buckets(edges: &[f64]) -> Vec<Bucket> {
    let mut buckets = Vec::with_capacity(edges.len() + 2);
    buckets.push(Bucket::new("no change".to_string(), 0.0, Some(0.0)));

    let mut lower = 0.0;
    for &edge in edges {
        buckets.push(Bucket::new(
            format!("{} - {}", thousands(lower), thousands(edge)),
            lower,
            Some(edge),
        ));
        lower = edge;
    }
    buckets.push(Bucket::new(format!("> {}", thousands(lower)), lower, None));
    buckets
}

/// Index of the bucket holding `change`.
fn bucket_index(edges: &[f64], change: f64) -> usize {
    let magnitude = change.abs();
    if magnitude == 0.0 {
        return 0;
    }
    // first edge with magnitude <= edge; past the last edge is the open bucket
    1 + edges.partition_point(|&edge| edge < magnitude)
}

fn build(rows: &[&ClientRow], group: Option<ChannelGroup>, edges: &[f64]) -> Histogram {
    let mut buckets = empty_buckets(edges);
    for row in rows {
        buckets[bucket_index(edges, row.change)].add(row.change);
    }
    Histogram { group, buckets }
}

fn check_edges(edges: &[f64]) -> Result<()> {
    let valid = edges.iter().all(|e| e.is_finite() && *e > 0.0)
        && edges.windows(2).all(|w| w[0] < w[1]);
    if valid {
        Ok(())
    } else {
        Err(ReconError::Config(
            "histogram edges must be positive and strictly increasing".into(),
        ))
    }
}

/// Histogram of `|change|` for one scope.
pub fn change_histogram(
    table: &ReconciledTable,
    group: Option<ChannelGroup>,
    edges: &[f64],
) -> Result<Histogram> {
    check_edges(edges)?;
    let rows = table.rows()?;
    let scoped: Vec<&ClientRow> = rows
        .iter()
        .filter(|r| group.is_none_or(|g| r.channel_group == g))
        .collect();
    Ok(build(&scoped, group, edges))
}

/// Overall histogram followed by one per channel group present.
pub fn histograms(table: &ReconciledTable, edges: &[f64]) -> Result<Vec<Histogram>> {
    check_edges(edges)?;
    let rows = table.rows()?;

    let all: Vec<&ClientRow> = rows.iter().collect();
    let mut out = vec![build(&all, None, edges)];

    for group in ChannelGroup::ALL {
        let scoped: Vec<&ClientRow> = rows.iter().filter(|r| r.channel_group == group).collect();
        if !scoped.is_empty() {
            out.push(build(&scoped, Some(group), edges));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{FeeTier, Presence};
    use approx::assert_relative_eq;

    const EDGES: [f64; 3] = [1_000.0, 10_000.0, 100_000.0];

    fn row(code: &str, group: ChannelGroup, change: f64) -> ClientRow {
        ClientRow {
            custcode: code.to_string(),
            custname: None,
            salesid: None,
            channel_group: group,
            fee_tier: FeeTier::Normal,
            presence: Presence::Both,
            previous_balance: 0.0,
            current_balance: change,
            change,
        }
    }

    #[test]
    fn test_bucket_labels() {
        let buckets = empty_buckets(&EDGES);
        let labels: Vec<&str> = buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "no change",
                "0 - 1,000",
                "1,000 - 10,000",
                "10,000 - 100,000",
                "> 100,000"
            ]
        );
        assert_eq!(buckets.last().unwrap().upper, None);
    }

    #[test]
    fn test_bucket_index_boundaries() {
        assert_eq!(bucket_index(&EDGES, 0.0), 0);
        assert_eq!(bucket_index(&EDGES, 0.5), 1);
        assert_eq!(bucket_index(&EDGES, 1_000.0), 1);
        assert_eq!(bucket_index(&EDGES, -1_000.5), 2);
        assert_eq!(bucket_index(&EDGES, 100_000.0), 3);
        assert_eq!(bucket_index(&EDGES, 100_000.1), 4);
    }

    #[test]
    fn test_counts_and_net_change() {
        let rows = [
            row("A", ChannelGroup::Ipot, 0.0),
            row("B", ChannelGroup::Ipot, 500.0),
            row("C", ChannelGroup::Wm, -700.0),
            row("D", ChannelGroup::Wm, 250_000.0),
        ];
        let refs: Vec<&ClientRow> = rows.iter().collect();
        let hist = build(&refs, None, &EDGES);

        assert_eq!(hist.buckets.len(), EDGES.len() + 2);
        assert_eq!(hist.clients(), 4);
        assert_eq!(hist.buckets[0].clients, 1);
        assert_eq!(hist.buckets[1].increases, 1);
        assert_eq!(hist.buckets[1].decreases, 1);
        assert_relative_eq!(hist.buckets[1].net_change, -200.0);
        assert_eq!(hist.buckets[4].clients, 1);
        assert_eq!(hist.scope(), "All");
    }

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(0.0), "0");
        assert_eq!(thousands(999.0), "999");
        assert_eq!(thousands(1_000.0), "1,000");
        assert_eq!(thousands(12_345_678.0), "12,345,678");
    }

    #[test]
    fn test_check_edges() {
        assert!(check_edges(&EDGES).is_ok());
        assert!(check_edges(&[]).is_ok());
        assert!(check_edges(&[5.0, 5.0]).is_err());
        assert!(check_edges(&[-1.0]).is_err());
    }
}
