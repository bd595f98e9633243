//! `tether read <declaration>` — report the remote relation set and drift.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use tether_sync::pipeline::{self, Mode, RunOutcome};

use super::report;
use crate::remote::GlobalArgs;

/// Arguments for `tether read`.
#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Declaration YAML file.
    pub declaration: PathBuf,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl ReadArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let home = global.home_dir()?;
        let declaration = super::load_declaration(&self.declaration)?;
        let mut remote = global.open_remote()?;

        let outcome = pipeline::run(&home, &mut remote, &declaration, Mode::Read)
            .with_context(|| format!("read failed for '{}'", declaration.owner))?;
        let RunOutcome::Reconciled(result) = outcome else {
            bail!("unexpected pipeline outcome for read");
        };

        if self.json {
            return report::print_reconciliation_json(&result, false);
        }
        report::print_reconciliation(&result);
        Ok(())
    }
}
