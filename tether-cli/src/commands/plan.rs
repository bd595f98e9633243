//! `tether plan <declaration>` — offline diff against the last applied declaration.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;

use tether_sync::pipeline;

use crate::remote::GlobalArgs;

/// Arguments for `tether plan`.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Declaration YAML file.
    pub declaration: PathBuf,
}

impl PlanArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let home = global.home_dir()?;
        let declaration = super::load_declaration(&self.declaration)?;
        let preview = pipeline::preview(&home, &declaration)
            .with_context(|| format!("plan failed for '{}'", declaration.owner))?;

        match preview.reconciled_at {
            Some(at) if preview.has_previous => println!(
                "Last applied {} ago ({})",
                format_age(at),
                at.to_rfc3339()
            ),
            _ if preview.has_previous => {}
            _ => println!(
                "No previous apply recorded for '{}'; every declared relation will be created.",
                declaration.owner
            ),
        }
        println!(
            "Plan for '{}': {} delete(s), {} upsert(s)",
            declaration.owner,
            preview.plan.to_delete.len(),
            preview.plan.to_upsert.len()
        );
        for target_id in &preview.plan.to_delete {
            println!("  {}  {target_id}", "-".red().bold());
        }
        for relation in &preview.plan.to_upsert {
            println!(
                "  {}  {} (priority {})",
                "+".green().bold(),
                relation.target_id,
                relation.ordering
            );
        }

        if preview.unified_diff.is_empty() {
            println!("Declaration unchanged since the last apply.");
            return Ok(());
        }
        print!("{}", preview.unified_diff);
        if !preview.unified_diff.ends_with('\n') {
            println!();
        }
        Ok(())
    }
}

fn format_age(timestamp: DateTime<Utc>) -> String {
    let seconds = Utc::now()
        .signed_duration_since(timestamp)
        .num_seconds()
        .max(0);
    match seconds {
        s if s < 60 => format!("{s}s"),
        s if s < 60 * 60 => format!("{}m", s / 60),
        s if s < 60 * 60 * 24 => format!("{}h", s / (60 * 60)),
        s => format!("{}d", s / (60 * 60 * 24)),
    }
}
