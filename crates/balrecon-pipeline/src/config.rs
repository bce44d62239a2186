//! Pipeline configuration.
//!
//! Every knob has a default matching the business rules the reports were
//! built around, so `ReconConfig::default()` is a working configuration.
//! Files are TOML; any section or key may be omitted.

use balrecon_traits::{ReconError, Result, columns};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Source header names of the snapshot exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    /// Client code header (default: `custcode`)
    pub client_code: String,
    /// Client name header (default: `custname`)
    pub client_name: String,
    /// Sales id header (default: `salesid`)
    pub sales_id: String,
    /// Balance header (default: `currentbal`)
    pub balance: String,
    /// Interest rate header, optional in the export (default: `intrate`)
    pub interest_rate: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            client_code: columns::CUSTCODE.to_string(),
            client_name: columns::CUSTNAME.to_string(),
            sales_id: columns::SALESID.to_string(),
            balance: columns::BALANCE.to_string(),
            interest_rate: columns::INTRATE.to_string(),
        }
    }
}

/// Fee tier rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeTierConfig {
    /// Interest rates strictly below this are Special (default: 15.0)
    pub threshold: f64,
}

impl Default for FeeTierConfig {
    fn default() -> Self {
        Self { threshold: 15.0 }
    }
}

/// Ranking view size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Rows in each top and bottom list (default: 20)
    pub top_n: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self { top_n: 20 }
    }
}

/// Bucket edges for the change-magnitude histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramConfig {
    /// Upper bounds of the finite buckets, strictly increasing
    /// (default: 1e3, 1e4, 1e5, 1e6, 1e7)
    pub edges: Vec<f64>,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            edges: vec![1_000.0, 10_000.0, 100_000.0, 1_000_000.0, 10_000_000.0],
        }
    }
}

/// Full pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconConfig {
    /// Field separator of the exports (default: `|`)
    pub separator: char,
    /// Source header names
    pub columns: ColumnMapping,
    /// Fee tier rule
    pub fee_tier: FeeTierConfig,
    /// Ranking view size
    pub ranking: RankingConfig,
    /// Histogram buckets
    pub histogram: HistogramConfig,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            separator: '|',
            columns: ColumnMapping::default(),
            fee_tier: FeeTierConfig::default(),
            ranking: RankingConfig::default(),
            histogram: HistogramConfig::default(),
        }
    }
}

impl ReconConfig {
    /// Parses a TOML document and validates it.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| ReconError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Renders the configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ReconError::Serialization(e.to_string()))
    }

    /// Separator as the single byte the CSV reader expects.
    pub fn separator_byte(&self) -> Result<u8> {
        u8::try_from(u32::from(self.separator))
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                ReconError::Config(format!("separator {:?} is not ASCII", self.separator))
            })
    }

    /// Checks internal consistency.
    pub fn validate(&self) -> Result<()> {
        self.separator_byte()?;

        let headers = [
            &self.columns.client_code,
            &self.columns.client_name,
            &self.columns.sales_id,
            &self.columns.balance,
            &self.columns.interest_rate,
        ];
        if headers.iter().any(|h| h.trim().is_empty()) {
            return Err(ReconError::Config("column names must not be empty".into()));
        }

        if !self.fee_tier.threshold.is_finite() {
            return Err(ReconError::Config(format!(
                "fee tier threshold must be finite, got {}",
                self.fee_tier.threshold
            )));
        }

        if self.ranking.top_n == 0 {
            return Err(ReconError::Config("ranking.top_n must be at least 1".into()));
        }

        let edges = &self.histogram.edges;
        if edges.iter().any(|e| !e.is_finite() || *e <= 0.0) {
            return Err(ReconError::Config(
                "histogram edges must be positive finite numbers".into(),
            ));
        }
        if edges.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ReconError::Config(
                "histogram edges must be strictly increasing".into(),
            ));
        }

        Ok(())
    }
}
