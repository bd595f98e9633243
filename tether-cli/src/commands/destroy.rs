//! `tether destroy <declaration>` — delete every declared relation.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;

use tether_sync::pipeline::{self, Mode, RunOutcome};

use super::report::{self, OutcomeJson};
use crate::remote::GlobalArgs;

/// Arguments for `tether destroy`.
#[derive(Args, Debug)]
pub struct DestroyArgs {
    /// Declaration YAML file.
    pub declaration: PathBuf,

    /// Show what would be deleted without deleting anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct DestroyJson<'a> {
    owner: &'a str,
    dry_run: bool,
    applied: Vec<OutcomeJson<'a>>,
}

impl DestroyArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let home = global.home_dir()?;
        let declaration = super::load_declaration(&self.declaration)?;
        let mut remote = global.open_remote()?;

        let outcome = pipeline::run(
            &home,
            &mut remote,
            &declaration,
            Mode::Destroy {
                dry_run: self.dry_run,
            },
        );
        // Operations applied before a failure stay applied; keep the fixture in step.
        let persisted = if self.dry_run { Ok(()) } else { remote.persist() };
        let outcome = super::settle(
            outcome,
            persisted,
            format!("destroy failed for '{}'", declaration.owner),
        )?;
        let RunOutcome::Destroyed(outcomes) = outcome else {
            bail!("unexpected pipeline outcome for destroy");
        };

        if self.json {
            return report::print_json(&DestroyJson {
                owner: &declaration.owner.0,
                dry_run: self.dry_run,
                applied: report::outcomes_json(&outcomes),
            });
        }

        let prefix = if self.dry_run { "[dry-run] " } else { "" };
        if outcomes.is_empty() {
            println!("{prefix}✓ '{}' — nothing to delete", declaration.owner);
            return Ok(());
        }
        println!(
            "{prefix}✓ '{}' destroyed ({} relation(s))",
            declaration.owner,
            outcomes.len()
        );
        report::print_outcomes(&outcomes);
        Ok(())
    }
}
