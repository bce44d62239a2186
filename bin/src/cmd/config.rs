//! Config command implementation.

use super::Context;
use anyhow::Result;

/// Print the configuration in effect, flags applied, as TOML.
pub(crate) fn run(ctx: &Context) -> Result<()> {
    print!("{}", ctx.config().to_toml_string()?);
    Ok(())
}
