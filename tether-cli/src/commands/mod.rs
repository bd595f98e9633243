pub mod apply;
pub mod destroy;
pub mod plan;
pub mod read;
mod report;

use std::path::Path;

use anyhow::{Context, Result};

use tether_core::{declaration, Declaration};

/// Load and validate a declaration file.
fn load_declaration(path: &Path) -> Result<Declaration> {
    declaration::load_at(path)
        .with_context(|| format!("failed to load declaration {}", path.display()))
}

/// Merge a pipeline result with the fixture write that follows it.
///
/// A pipeline failure wins; a failed write is appended to its context so
/// neither error is lost.
fn settle<T, E>(outcome: Result<T, E>, persisted: Result<()>, context: String) -> Result<T>
where
    E: std::error::Error + Send + Sync + 'static,
{
    match (outcome, persisted) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(write)) => Err(write),
        (Err(err), Ok(())) => Err(anyhow::Error::new(err).context(context)),
        (Err(err), Err(write)) => {
            Err(anyhow::Error::new(err).context(format!("{context} (also: {write:#})")))
        }
    }
}
