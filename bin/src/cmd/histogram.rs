//! Histogram command implementation.

use super::{Context, parse_group};
use anyhow::Result;
use balrecon::pipeline::change_histogram;
use balrecon::render::{write_header, write_histogram};
use std::io::{Write, stdout};
use std::path::Path;

/// Print the change distribution of one scope.
pub(crate) fn run(ctx: &Context, previous: &Path, current: &Path, group: Option<&str>) -> Result<()> {
    let group = parse_group(group)?;
    let report = ctx.report(previous, current)?;
    let histogram = change_histogram(report.table(), group, &ctx.config().histogram.edges)?;

    let mut out = stdout().lock();
    write_header(&mut out, &report.meta)?;
    write_histogram(&mut out, &histogram)?;
    out.flush()?;
    Ok(())
}
