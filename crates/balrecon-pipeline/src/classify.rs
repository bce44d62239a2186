//! Business classification of reconciled clients.
//!
//! Every client lands in exactly one [`ChannelGroup`] and exactly one
//! [`FeeTier`], so grouping by either column partitions the table.

use crate::config::FeeTierConfig;
use balrecon_traits::{Result, columns};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sales channel bucket derived from the sales id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChannelGroup {
    /// Online trading platform accounts (`IPOT`)
    Ipot,
    /// Wealth management desks (sales ids starting with `WM`)
    Wm,
    /// Private dealing desk (`Private Dealing` or `RT2`)
    PrivateDealing,
    /// Everything else, including a missing sales id
    Others,
}

impl ChannelGroup {
    /// All groups in report order.
    pub const ALL: [Self; 4] = [Self::Ipot, Self::Wm, Self::PrivateDealing, Self::Others];

    /// Classifies a sales id. Matching ignores case and surrounding spaces.
    #[must_use]
    pub fn classify(sales_id: Option<&str>) -> Self {
        let Some(id) = sales_id.map(|s| s.trim().to_ascii_uppercase()) else {
            return Self::Others;
        };

        if id == "IPOT" {
            Self::Ipot
        } else if id.starts_with("WM") {
            Self::Wm
        } else if id == "PRIVATE DEALING" || id == "RT2" {
            Self::PrivateDealing
        } else {
            Self::Others
        }
    }

    /// Display label, also the value stored in the `channel_group` column.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Ipot => "IPOT",
            Self::Wm => "WM",
            Self::PrivateDealing => "Private Dealing",
            Self::Others => "Others",
        }
    }

    /// Parses a label or a loose user spelling (`ipot`, `wm`, `pd`, `private-dealing`).
    #[must_use]
    pub fn from_label(text: &str) -> Option<Self> {
        let key: String = text
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match key.as_str() {
            "ipot" => Some(Self::Ipot),
            "wm" => Some(Self::Wm),
            "privatedealing" | "pd" | "rt2" => Some(Self::PrivateDealing),
            "others" | "other" => Some(Self::Others),
            _ => None,
        }
    }
}

impl fmt::Display for ChannelGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fee tier derived from the client's interest rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FeeTier {
    /// Standard pricing
    Normal,
    /// Negotiated rate below the threshold
    Special,
}

impl FeeTier {
    /// All tiers in report order.
    pub const ALL: [Self; 2] = [Self::Normal, Self::Special];

    /// A known rate strictly below `threshold` is Special; anything else is Normal.
    #[must_use]
    pub fn classify(rate: Option<f64>, threshold: f64) -> Self {
        match rate {
            Some(r) if r < threshold => Self::Special,
            _ => Self::Normal,
        }
    }

    /// Display label, also the value stored in the `fee_tier` column.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Special => "Special",
        }
    }

    /// Parses a label, ignoring case.
    #[must_use]
    pub fn from_label(text: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.label().eq_ignore_ascii_case(text.trim()))
    }
}

impl fmt::Display for FeeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which snapshot(s) carried a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Presence {
    /// In both snapshots
    Both,
    /// Only in the current snapshot
    New,
    /// Only in the previous snapshot
    Closed,
}

impl Presence {
    /// All values in report order.
    pub const ALL: [Self; 3] = [Self::Both, Self::New, Self::Closed];

    /// Display label, also the value stored in the `presence` column.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Both => "both",
            Self::New => "new",
            Self::Closed => "closed",
        }
    }

    /// Parses a label, ignoring case.
    #[must_use]
    pub fn from_label(text: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|presence| presence.label().eq_ignore_ascii_case(text.trim()))
    }
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Adds the `channel_group` and `fee_tier` label columns.
///
/// Expects the `salesid` and `intrate` columns of the joined table.
pub fn classify(mut df: DataFrame, fee_tier: &FeeTierConfig) -> Result<DataFrame> {
    let groups: Vec<&'static str> = df
        .column(columns::SALESID)?
        .as_materialized_series()
        .str()?
        .into_iter()
        .map(|id| ChannelGroup::classify(id).label())
        .collect();

    let tiers: Vec<&'static str> = df
        .column(columns::INTRATE)?
        .as_materialized_series()
        .f64()?
        .into_iter()
        .map(|rate| FeeTier::classify(rate, fee_tier.threshold).label())
        .collect();

    df.with_column(Series::new(columns::CHANNEL_GROUP.into(), groups))?;
    df.with_column(Series::new(columns::FEE_TIER.into(), tiers))?;
    Ok(df)
}
