//! Common types used throughout the balrecon pipeline.
//!
//! A [`Snapshot`] is one dated export of client balances after ingestion has
//! normalised it to the canonical columns listed in [`columns`].

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

// Re-export date type from chrono
pub use chrono::NaiveDate as Date;

/// A client account identifier as it appears in the exports.
pub type ClientCode = String;

/// Canonical column names used by every table the pipeline produces.
pub mod columns {
    /// Client code (join key).
    pub const CUSTCODE: &str = "custcode";
    /// Client display name.
    pub const CUSTNAME: &str = "custname";
    /// Sales-channel identifier.
    pub const SALESID: &str = "salesid";
    /// Balance within a single snapshot.
    pub const BALANCE: &str = "currentbal";
    /// Interest rate used to derive the fee tier.
    pub const INTRATE: &str = "intrate";
    /// Channel group label.
    pub const CHANNEL_GROUP: &str = "channel_group";
    /// Fee tier label.
    pub const FEE_TIER: &str = "fee_tier";
    /// Which snapshot(s) carried the client.
    pub const PRESENCE: &str = "presence";
    /// Balance in the earlier snapshot.
    pub const PREVIOUS_BALANCE: &str = "previous_balance";
    /// Balance in the later snapshot.
    pub const CURRENT_BALANCE: &str = "current_balance";
    /// `current_balance - previous_balance`.
    pub const CHANGE: &str = "change";

    /// Columns of a normalised snapshot, in order.
    pub const SNAPSHOT: [&str; 5] = [CUSTCODE, CUSTNAME, SALESID, BALANCE, INTRATE];

    /// Columns of the reconciled table, in order.
    pub const RECONCILED: [&str; 9] = [
        CUSTCODE,
        CUSTNAME,
        SALESID,
        CHANNEL_GROUP,
        FEE_TIER,
        PRESENCE,
        PREVIOUS_BALANCE,
        CURRENT_BALANCE,
        CHANGE,
    ];
}

/// Which of the two exports a snapshot is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotSide {
    /// The earlier export ("yesterday").
    Previous,
    /// The later export.
    Current,
}

impl SnapshotSide {
    /// Lowercase label used in messages.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Previous => "previous",
            Self::Current => "current",
        }
    }
}

impl fmt::Display for SnapshotSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalised balance export.
///
/// The wrapped DataFrame always has the columns of [`columns::SNAPSHOT`]:
/// `custcode` (String, never null), `custname` and `salesid` (String),
/// `currentbal` and `intrate` (Float64). Rows keep file order.
///
/// # Example
///
/// ```no_run
/// use balrecon_traits::{Snapshot, SnapshotSide};
/// use polars::prelude::*;
///
/// let df = df! {
///     "custcode" => &["C001"],
///     "custname" => &["Alice"],
///     "salesid" => &["IPOT"],
///     "currentbal" => &[1500.0],
///     "intrate" => &[Some(12.0)],
/// }.unwrap();
///
/// let snapshot = Snapshot::new(df, SnapshotSide::Current, None);
/// ```
#[derive(Debug, Clone)]
pub struct Snapshot {
    data: DataFrame,
    side: SnapshotSide,
    as_of: Option<Date>,
}

impl Snapshot {
    /// Creates a snapshot from an already normalised DataFrame.
    pub const fn new(data: DataFrame, side: SnapshotSide, as_of: Option<Date>) -> Self {
        Self { data, side, as_of }
    }

    /// Returns a reference to the underlying DataFrame.
    pub const fn data(&self) -> &DataFrame {
        &self.data
    }

    /// Consumes self and returns the underlying DataFrame.
    pub fn into_inner(self) -> DataFrame {
        self.data
    }

    /// Which export this is.
    pub const fn side(&self) -> SnapshotSide {
        self.side
    }

    /// The business date of the export, when known.
    pub const fn as_of(&self) -> Option<Date> {
        self.as_of
    }

    /// Replaces the business date.
    #[must_use]
    pub const fn with_as_of(mut self, as_of: Option<Date>) -> Self {
        self.as_of = as_of;
        self
    }

    /// Number of balance rows (before aggregation).
    pub fn len(&self) -> usize {
        self.data.height()
    }

    /// Whether the export carried no rows.
    pub fn is_empty(&self) -> bool {
        self.data.height() == 0
    }

    /// Checks if a column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.data
            .get_column_names()
            .iter()
            .any(|s| s.as_str() == name)
    }
}

impl AsRef<DataFrame> for Snapshot {
    fn as_ref(&self) -> &DataFrame {
        &self.data
    }
}
