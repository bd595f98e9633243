//! `tether apply <declaration>` — converge the remote relation set.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;

use tether_sync::{
    pipeline::{self, Mode, RunOutcome},
    ApplyOutcome,
};

use super::report;
use crate::remote::GlobalArgs;

/// Arguments for `tether apply`.
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Declaration YAML file.
    pub declaration: PathBuf,

    /// Show what would change without touching the remote system or the state.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl ApplyArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let home = global.home_dir()?;
        let declaration = super::load_declaration(&self.declaration)?;
        let mut remote = global.open_remote()?;

        let outcome = pipeline::run(
            &home,
            &mut remote,
            &declaration,
            Mode::Apply {
                dry_run: self.dry_run,
            },
        );
        // Operations applied before a failure stay applied; keep the fixture in step.
        let persisted = if self.dry_run { Ok(()) } else { remote.persist() };
        let outcome = super::settle(
            outcome,
            persisted,
            format!("apply failed for '{}'", declaration.owner),
        )?;

        let RunOutcome::Reconciled(result) = outcome else {
            bail!("unexpected pipeline outcome for apply");
        };

        if self.json {
            return report::print_reconciliation_json(&result, self.dry_run);
        }

        let prefix = if self.dry_run { "[dry-run] " } else { "" };
        let deleted = result
            .applied
            .iter()
            .filter(|o| {
                matches!(
                    o,
                    ApplyOutcome::Deleted { .. } | ApplyOutcome::WouldDelete { .. }
                )
            })
            .count();
        let upserted = result
            .applied
            .iter()
            .filter(|o| {
                matches!(
                    o,
                    ApplyOutcome::Upserted { .. } | ApplyOutcome::WouldUpsert { .. }
                )
            })
            .count();
        println!(
            "{prefix}✓ '{}' reconciled ({upserted} upserted, {deleted} deleted)",
            result.owner
        );
        report::print_outcomes(&result.applied);
        report::print_reconciliation(&result);
        Ok(())
    }
}
