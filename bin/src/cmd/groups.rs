//! Groups command implementation.

use super::{Context, GroupBy};
use anyhow::{Result, anyhow};
use balrecon::pipeline::Dimension;
use balrecon::render::{write_header, write_summary};
use std::io::{Write, stdout};
use std::path::Path;

/// Print one grouped sum table.
pub(crate) fn run(ctx: &Context, previous: &Path, current: &Path, by: GroupBy) -> Result<()> {
    let report = ctx.report(previous, current)?;
    let dimension = Dimension::from(by);
    let summary = report
        .summary(dimension)
        .ok_or_else(|| anyhow!("no summary for {dimension}"))?;

    let mut out = stdout().lock();
    write_header(&mut out, &report.meta)?;
    write_summary(&mut out, summary)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::tests::{context, write_exports};

    #[test]
    fn test_every_grouping_runs() {
        let dir = tempfile::tempdir().unwrap();
        let (previous, current) = write_exports(dir.path());
        for by in [GroupBy::Channel, GroupBy::Tier, GroupBy::Presence, GroupBy::ChannelTier] {
            run(&context(), &previous, &current, by).unwrap();
        }
    }
}
