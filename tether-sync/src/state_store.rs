//! State store — the last applied declaration and observed view per owner.
//!
//! Persists an `OwnerState` JSON document at
//! `<home>/.tether/state/<owner>.json`.
//! Writes use the atomic `.tmp` + rename pattern.
//!
//! The remote relation set is never stored here: it is re-fetched on every
//! cycle. Only what the caller owns is kept: the previous declaration (to
//! compute deletions) and the previous view (to know which payload fields
//! are tracked).

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tether_core::{DesiredSet, ObservedView, OwnerId};

use crate::error::{io_err, SyncError};

/// On-disk state payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct OwnerState {
    /// Owner the state belongs to. `None` only for an empty state.
    #[serde(default)]
    pub owner: Option<OwnerId>,
    /// When the last non-dry-run reconciliation finished. `None` if never.
    #[serde(default)]
    pub reconciled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub declared: DesiredSet,
    #[serde(default)]
    pub view: ObservedView,
}

/// Path to the state JSON for a given owner, rooted at `home`.
///
/// `~/.tether/state/<owner>.json`; bytes outside `[A-Za-z0-9._-]` are
/// percent-encoded, so distinct owners never share a file.
pub fn store_path_at(home: &Path, owner: &OwnerId) -> PathBuf {
    let mut file_stem = String::with_capacity(owner.0.len());
    for byte in owner.0.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'_' | b'-') {
            file_stem.push(byte as char);
        } else {
            file_stem.push_str(&format!("%{byte:02X}"));
        }
    }
    home.join(".tether")
        .join("state")
        .join(format!("{file_stem}.json"))
}

/// Load the state for `owner`.
///
/// Returns an empty state if the file does not yet exist, and
/// `SyncError::StateOwnerMismatch` if the file records a different owner.
pub fn load_at(home: &Path, owner: &OwnerId) -> Result<OwnerState, SyncError> {
    let path = store_path_at(home, owner);
    if !path.exists() {
        return Ok(OwnerState::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    let state: OwnerState = serde_json::from_str(&contents)?;
    match &state.owner {
        Some(recorded) if recorded != owner => Err(SyncError::StateOwnerMismatch {
            path,
            expected: owner.clone(),
            found: recorded.clone(),
        }),
        _ => Ok(state),
    }
}

/// Save the state for `owner` atomically.
///
/// Writes to `<path>.tmp` then renames to `<path>`.
pub fn save_at(home: &Path, owner: &OwnerId, state: &OwnerState) -> Result<(), SyncError> {
    let path = store_path_at(home, owner);
    let Some(dir) = path.parent() else {
        return Err(io_err(
            path,
            std::io::Error::other("invalid state store path"),
        ));
    };

    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

    let json = serde_json::to_string_pretty(state)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, &path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(&path, e));
    }
    Ok(())
}

/// Remove the state for `owner`. Returns whether a file was removed.
pub fn remove_at(home: &Path, owner: &OwnerId) -> Result<bool, SyncError> {
    let path = store_path_at(home, owner);
    match std::fs::remove_file(&path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(io_err(&path, e)),
    }
}
