//! Rank command implementation.

use super::{Context, RankBy, parse_group};
use anyhow::Result;
use balrecon::pipeline::{RankMetric, rank};
use balrecon::render::{write_header, write_ranking};
use std::io::{Write, stdout};
use std::path::Path;

/// Print the top and bottom clients of one scope.
pub(crate) fn run(
    ctx: &Context,
    previous: &Path,
    current: &Path,
    by: RankBy,
    group: Option<&str>,
) -> Result<()> {
    let group = parse_group(group)?;
    let report = ctx.report(previous, current)?;
    let ranking = rank(
        report.table(),
        group,
        RankMetric::from(by),
        ctx.config().ranking.top_n,
    )?;

    let mut out = stdout().lock();
    write_header(&mut out, &report.meta)?;
    if ranking.clients == 0 {
        writeln!(out, "\nNo clients in {}", ranking.scope())?;
    } else {
        write_ranking(&mut out, &ranking)?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::tests::{context, write_exports};

    #[test]
    fn test_rank_scopes() {
        let dir = tempfile::tempdir().unwrap();
        let (previous, current) = write_exports(dir.path());
        let ctx = context();

        run(&ctx, &previous, &current, RankBy::Change, None).unwrap();
        run(&ctx, &previous, &current, RankBy::Balance, Some("WM")).unwrap();
        run(&ctx, &previous, &current, RankBy::Change, Some("all")).unwrap();
        assert!(run(&ctx, &previous, &current, RankBy::Change, Some("retail")).is_err());
    }
}
