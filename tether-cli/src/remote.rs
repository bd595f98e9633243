//! Global settings and remote resolution.
//!
//! `--remote` is either an `http(s)://` base URL, served by [`HttpTransport`],
//! or a path to a JSON fixture file shaped `{ "<owner>": [relations…] }`.
//! A fixture is loaded into a [`MemoryTransport`] and written back by
//! [`Remote::persist`] once the command has mutated it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;

use tether_core::{codec, OwnerId, Relation, TargetId, WireRelation};
use tether_sync::{MemoryTransport, Transport, TransportError};

use crate::http::HttpTransport;

/// Settings shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Directory holding `.tether/state` (defaults to the home directory).
    #[arg(long, global = true)]
    pub home: Option<PathBuf>,

    /// Remote system: an http(s) base URL or a JSON fixture file.
    #[arg(long, global = true, env = "TETHER_REMOTE")]
    pub remote: Option<String>,

    /// Bearer token sent to an HTTP remote.
    #[arg(long, global = true, env = "TETHER_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Per-request timeout for an HTTP remote.
    #[arg(long, global = true, default_value_t = 30)]
    pub timeout_secs: u64,
}

impl GlobalArgs {
    pub fn home_dir(&self) -> Result<PathBuf> {
        match &self.home {
            Some(home) => Ok(home.clone()),
            None => dirs::home_dir().context("could not determine home directory"),
        }
    }

    pub fn open_remote(&self) -> Result<Remote> {
        let Some(remote) = self.remote.as_deref() else {
            bail!("no remote configured; pass --remote or set TETHER_REMOTE");
        };

        if remote.starts_with("http://") || remote.starts_with("https://") {
            tracing::debug!("using HTTP remote {remote}");
            return Ok(Remote::Http(HttpTransport::new(
                remote,
                self.token.clone(),
                Duration::from_secs(self.timeout_secs),
            )));
        }

        let path = PathBuf::from(remote);
        let transport = load_fixture(&path)
            .with_context(|| format!("failed to load remote fixture {}", path.display()))?;
        tracing::debug!("using fixture remote {}", path.display());
        Ok(Remote::Fixture { path, transport })
    }
}

// ---------------------------------------------------------------------------
// Remote
// ---------------------------------------------------------------------------

pub enum Remote {
    Http(HttpTransport),
    Fixture {
        path: PathBuf,
        transport: MemoryTransport,
    },
}

impl Remote {
    /// Write a fixture remote back to disk. HTTP remotes need nothing.
    pub fn persist(self) -> Result<()> {
        match self {
            Remote::Http(_) => Ok(()),
            Remote::Fixture { path, transport } => save_fixture(&path, &transport)
                .with_context(|| format!("failed to write remote fixture {}", path.display())),
        }
    }
}

impl Transport for Remote {
    fn create_or_update(
        &mut self,
        owner: &OwnerId,
        relation: &Relation,
    ) -> Result<(), TransportError> {
        match self {
            Remote::Http(http) => http.create_or_update(owner, relation),
            Remote::Fixture { transport, .. } => transport.create_or_update(owner, relation),
        }
    }

    fn delete(&mut self, owner: &OwnerId, target_id: &TargetId) -> Result<(), TransportError> {
        match self {
            Remote::Http(http) => http.delete(owner, target_id),
            Remote::Fixture { transport, .. } => transport.delete(owner, target_id),
        }
    }

    fn list_all(&mut self, owner: &OwnerId) -> Result<Vec<Relation>, TransportError> {
        match self {
            Remote::Http(http) => http.list_all(owner),
            Remote::Fixture { transport, .. } => transport.list_all(owner),
        }
    }
}

// ---------------------------------------------------------------------------
// Fixture file
// ---------------------------------------------------------------------------

fn load_fixture(path: &Path) -> Result<MemoryTransport> {
    let contents = std::fs::read_to_string(path)?;
    let raw: BTreeMap<String, Vec<WireRelation>> =
        serde_json::from_str(&contents).context("fixture is not valid JSON")?;

    let mut owners = BTreeMap::new();
    for (owner, wires) in raw {
        let relations = codec::decode_all(wires)
            .with_context(|| format!("invalid relation for owner '{owner}'"))?;
        owners.insert(owner, relations);
    }
    Ok(MemoryTransport::from_snapshot(owners))
}

fn save_fixture(path: &Path, transport: &MemoryTransport) -> Result<()> {
    let raw: BTreeMap<&str, Vec<WireRelation>> = transport
        .snapshot()
        .iter()
        .map(|(owner, relations)| (owner.as_str(), relations.iter().map(codec::encode).collect()))
        .collect();
    let json = serde_json::to_string_pretty(&raw)?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}
