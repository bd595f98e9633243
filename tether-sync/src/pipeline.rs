//! Shared pipeline entrypoint used by the CLI.
//!
//! Wraps a [`Reconciler`] with the per-owner state store: the previous
//! declaration and view are loaded before the cycle and, for real applies,
//! replaced after it.

use std::path::Path;

use chrono::{DateTime, Utc};

use tether_core::Declaration;

use crate::apply::ApplyOutcome;
use crate::diff::{self, Plan};
use crate::reconciler::{Reconciler, Reconciliation};
use crate::state_store::{self, OwnerState};
use crate::transport::Transport;
use crate::SyncError;

/// What a pipeline run does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Converge the remote side onto the declaration.
    Apply { dry_run: bool },
    /// Fetch and build the view only.
    Read,
    /// Delete every declared relation and forget the stored state.
    Destroy { dry_run: bool },
}

/// Outcome of a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Reconciled(Reconciliation),
    Destroyed(Vec<ApplyOutcome>),
}

/// Offline plan against the stored previous declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanPreview {
    pub plan: Plan,
    /// Unified diff of the stored vs. new declaration; empty if identical.
    pub unified_diff: String,
    /// Whether a previous declaration was found.
    pub has_previous: bool,
    /// When the stored declaration was applied.
    pub reconciled_at: Option<DateTime<Utc>>,
}

/// Run the pipeline for `declaration`.
///
/// State is written for a non-dry-run `Apply` (saved) or `Destroy`
/// (removed). If the owner no longer exists remotely, a `Read` or
/// non-dry-run `Apply` also removes the stored state before returning
/// `SyncError::OwnerNotFound`.
pub fn run<T: Transport>(
    home: &Path,
    transport: T,
    declaration: &Declaration,
    mode: Mode,
) -> Result<RunOutcome, SyncError> {
    let owner = &declaration.owner;
    let state = state_store::load_at(home, owner)?;

    match mode {
        Mode::Apply { dry_run } => {
            let mut reconciler = Reconciler::new(transport).with_dry_run(dry_run);
            let result =
                reconciler.reconcile(owner, &state.declared, &declaration.desired, &state.view);
            let result = if dry_run {
                result?
            } else {
                forget_if_gone(home, result)?
            };
            if !dry_run {
                let next = OwnerState {
                    owner: Some(owner.clone()),
                    reconciled_at: Some(Utc::now()),
                    declared: declaration.desired.clone(),
                    view: result.view.clone(),
                };
                state_store::save_at(home, owner, &next)?;
            }
            Ok(RunOutcome::Reconciled(result))
        }
        Mode::Read => {
            let mut reconciler = Reconciler::new(transport);
            let result = reconciler.read(owner, &declaration.desired, &state.view);
            let result = forget_if_gone(home, result)?;
            Ok(RunOutcome::Reconciled(result))
        }
        Mode::Destroy { dry_run } => {
            let mut reconciler = Reconciler::new(transport).with_dry_run(dry_run);
            let outcomes = reconciler.delete(owner, &declaration.desired)?;
            if !dry_run {
                state_store::remove_at(home, owner)?;
            }
            Ok(RunOutcome::Destroyed(outcomes))
        }
    }
}

/// Drop the stored state of an owner the remote side reports as gone.
fn forget_if_gone<R>(home: &Path, result: Result<R, SyncError>) -> Result<R, SyncError> {
    if let Err(SyncError::OwnerNotFound { owner }) = &result {
        if state_store::remove_at(home, owner)? {
            tracing::warn!("{owner}: owner no longer exists remotely, stored state removed");
        }
    }
    result
}

/// Compute the plan for `declaration` against the stored previous
/// declaration, without contacting the remote side.
pub fn preview(home: &Path, declaration: &Declaration) -> Result<PlanPreview, SyncError> {
    let path = state_store::store_path_at(home, &declaration.owner);
    let has_previous = path.exists();
    let state = state_store::load_at(home, &declaration.owner)?;
    Ok(PlanPreview {
        plan: diff::diff(&state.declared, &declaration.desired),
        unified_diff: diff::render_unified(
            &state.declared,
            &declaration.desired,
            &declaration.owner.0,
        ),
        has_previous,
        reconciled_at: state.reconciled_at,
    })
}
