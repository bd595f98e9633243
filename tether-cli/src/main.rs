//! tether — keep an owner's relations on a remote system exactly as declared.
//!
//! # Usage
//!
//! ```text
//! tether plan <declaration.yaml>
//! tether apply <declaration.yaml> [--dry-run] [--json]
//! tether read <declaration.yaml> [--json]
//! tether destroy <declaration.yaml> [--dry-run]
//!
//! global: --home <dir> --remote <url|fixture.json> --token <token> --timeout-secs <n>
//! ```

mod commands;
mod http;
mod remote;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{apply::ApplyArgs, destroy::DestroyArgs, plan::PlanArgs, read::ReadArgs};
use remote::GlobalArgs;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "tether",
    version,
    about = "Reconcile an owner's relation set against a remote system",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show what apply would change, compared with the last applied declaration.
    Plan(PlanArgs),

    /// Converge the remote relation set onto the declaration.
    Apply(ApplyArgs),

    /// Fetch the remote relation set and report drift without changing anything.
    Read(ReadArgs),

    /// Remove every declared relation and forget the stored state.
    Destroy(DestroyArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Plan(args) => args.run(&cli.global),
        Commands::Apply(args) => args.run(&cli.global),
        Commands::Read(args) => args.run(&cli.global),
        Commands::Destroy(args) => args.run(&cli.global),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
