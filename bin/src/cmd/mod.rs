//! CLI subcommand modules.
//!
//! This module contains the implementations for all balrecon CLI subcommands
//! and the settings they share.

pub(crate) mod compare;
pub(crate) mod config;
pub(crate) mod groups;
pub(crate) mod histogram;
pub(crate) mod rank;

use anyhow::{Context as _, Result, bail};
use balrecon::pipeline::{ChannelGroup, Dimension, RankMetric, parse_snapshot_date};
use balrecon::{Date, ReconConfig, Reconciler, Report};
use clap::ValueEnum;
use std::path::{Path, PathBuf};

/// Grouping accepted by `groups --by`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum GroupBy {
    Channel,
    Tier,
    Presence,
    ChannelTier,
}

impl From<GroupBy> for Dimension {
    fn from(by: GroupBy) -> Self {
        match by {
            GroupBy::Channel => Self::Channel,
            GroupBy::Tier => Self::FeeTier,
            GroupBy::Presence => Self::Presence,
            GroupBy::ChannelTier => Self::ChannelAndTier,
        }
    }
}

/// Metric accepted by `rank --by`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum RankBy {
    Change,
    Balance,
}

impl From<RankBy> for RankMetric {
    fn from(by: RankBy) -> Self {
        match by {
            RankBy::Change => Self::Change,
            RankBy::Balance => Self::CurrentBalance,
        }
    }
}

/// Global flags as parsed from the command line.
#[derive(Debug, Default)]
pub(crate) struct GlobalArgs {
    pub(crate) config: Option<PathBuf>,
    pub(crate) top: Option<usize>,
    pub(crate) fee_threshold: Option<f64>,
    pub(crate) previous_date: Option<String>,
    pub(crate) current_date: Option<String>,
}

/// Settings every subcommand runs with.
#[derive(Debug)]
pub(crate) struct Context {
    pub(crate) reconciler: Reconciler,
    pub(crate) previous_date: Option<Date>,
    pub(crate) current_date: Option<Date>,
}

impl Context {
    /// Loads the configuration file, if any, and applies flag overrides.
    pub(crate) fn from_args(args: GlobalArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => ReconConfig::load(path)
                .with_context(|| format!("loading configuration {}", path.display()))?,
            None => ReconConfig::default(),
        };

        if let Some(top) = args.top {
            config.ranking.top_n = top;
        }
        if let Some(threshold) = args.fee_threshold {
            config.fee_tier.threshold = threshold;
        }
        config.validate()?;

        Ok(Self {
            reconciler: Reconciler::new(config),
            previous_date: args.previous_date.as_deref().map(parse_date).transpose()?,
            current_date: args.current_date.as_deref().map(parse_date).transpose()?,
        })
    }

    pub(crate) const fn config(&self) -> &ReconConfig {
        self.reconciler.config()
    }

    /// Reads both exports and builds the report.
    pub(crate) fn report(&self, previous: &Path, current: &Path) -> Result<Report> {
        let report = self.reconciler.run_files(
            previous,
            current,
            self.previous_date,
            self.current_date,
        )?;
        Ok(report)
    }
}

/// Parses a `YYYY-MM-DD` date.
pub(crate) fn parse_date(text: &str) -> Result<Date> {
    Ok(parse_snapshot_date(text)?)
}

/// Parses a channel group name given on the command line.
pub(crate) fn parse_group(name: Option<&str>) -> Result<Option<ChannelGroup>> {
    let Some(name) = name else {
        return Ok(None);
    };
    if name.eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    match ChannelGroup::from_label(name) {
        Some(group) => Ok(Some(group)),
        None => bail!("unknown channel group {name:?} (expected IPOT, WM, Private Dealing or Others)"),
    }
}
