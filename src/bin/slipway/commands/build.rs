//! `slipway build` command

use anyhow::Result;

use crate::cli::CommonArgs;

pub fn execute(args: CommonArgs) -> Result<()> {
    super::with_lifecycle(&args, |lifecycle| lifecycle.build())
}
