//! Remote applier: executes a [`Plan`] against a [`Transport`].
//!
//! ## Execution order
//!
//! 1. Every delete, in plan order.
//! 2. Every upsert, in plan order.
//!
//! Calls are sequential. The first failure stops the batch and is returned
//! naming the target and the operation kind; operations already applied stay
//! applied. Re-running the batch is safe because every operation is
//! idempotent. A delete that finds nothing to delete counts as converged.

use tether_core::{OwnerId, TargetId};

use crate::diff::Plan;
use crate::error::{OpKind, SyncError, TransportError};
use crate::transport::Transport;

// ---------------------------------------------------------------------------
// Apply outcome
// ---------------------------------------------------------------------------

/// Outcome of an individual remote operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The relation was removed.
    Deleted { target_id: TargetId },
    /// Delete requested, but the relation was already gone.
    AlreadyAbsent { target_id: TargetId },
    /// The relation was created or overwritten.
    Upserted { target_id: TargetId },
    /// Dry-run mode: the relation *would* have been removed.
    WouldDelete { target_id: TargetId },
    /// Dry-run mode: the relation *would* have been created or overwritten.
    WouldUpsert { target_id: TargetId },
}

impl ApplyOutcome {
    pub fn target_id(&self) -> &TargetId {
        match self {
            ApplyOutcome::Deleted { target_id }
            | ApplyOutcome::AlreadyAbsent { target_id }
            | ApplyOutcome::Upserted { target_id }
            | ApplyOutcome::WouldDelete { target_id }
            | ApplyOutcome::WouldUpsert { target_id } => target_id,
        }
    }
}

// ---------------------------------------------------------------------------
// apply
// ---------------------------------------------------------------------------

/// Apply `plan` for `owner`: deletes first, then upserts.
pub fn apply<T: Transport + ?Sized>(
    transport: &mut T,
    owner: &OwnerId,
    plan: &Plan,
    dry_run: bool,
) -> Result<Vec<ApplyOutcome>, SyncError> {
    let mut outcomes = delete_all(transport, owner, plan.to_delete.iter(), dry_run)?;

    for relation in &plan.to_upsert {
        let target_id = &relation.target_id;
        if dry_run {
            tracing::info!("[dry-run] would upsert: {owner}/{target_id}");
            outcomes.push(ApplyOutcome::WouldUpsert {
                target_id: target_id.clone(),
            });
            continue;
        }

        transport
            .create_or_update(owner, relation)
            .map_err(|source| SyncError::Transport {
                op: OpKind::Upsert,
                target_id: target_id.clone(),
                source,
            })?;
        tracing::info!("upserted: {owner}/{target_id} (priority {})", relation.ordering);
        outcomes.push(ApplyOutcome::Upserted {
            target_id: target_id.clone(),
        });
    }

    Ok(outcomes)
}

// ---------------------------------------------------------------------------
// delete_all
// ---------------------------------------------------------------------------

/// Delete every target in `targets` for `owner`, treating not-found as done.
pub fn delete_all<'a, T: Transport + ?Sized>(
    transport: &mut T,
    owner: &OwnerId,
    targets: impl IntoIterator<Item = &'a TargetId>,
    dry_run: bool,
) -> Result<Vec<ApplyOutcome>, SyncError> {
    let mut outcomes = Vec::new();
    for target_id in targets {
        if dry_run {
            tracing::info!("[dry-run] would delete: {owner}/{target_id}");
            outcomes.push(ApplyOutcome::WouldDelete {
                target_id: target_id.clone(),
            });
            continue;
        }

        match transport.delete(owner, target_id) {
            Ok(()) => {
                tracing::info!("deleted: {owner}/{target_id}");
                outcomes.push(ApplyOutcome::Deleted {
                    target_id: target_id.clone(),
                });
            }
            Err(TransportError::NotFound) => {
                tracing::debug!("already absent: {owner}/{target_id}");
                outcomes.push(ApplyOutcome::AlreadyAbsent {
                    target_id: target_id.clone(),
                });
            }
            Err(source) => {
                return Err(SyncError::Transport {
                    op: OpKind::Delete,
                    target_id: target_id.clone(),
                    source,
                })
            }
        }
    }
    Ok(outcomes)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Call, MemoryTransport};
    use tether_core::Relation;

    fn owner() -> OwnerId {
        OwnerId::from("app1")
    }

    fn transport_with(targets: &[&str]) -> MemoryTransport {
        let mut t = MemoryTransport::new();
        t.add_owner(&owner());
        for id in targets {
            t.seed(&owner(), Relation::new(*id));
        }
        t
    }

    fn plan(delete: &[&str], upsert: &[&str]) -> Plan {
        Plan {
            to_delete: delete.iter().map(|id| TargetId::from(*id)).collect(),
            to_upsert: upsert.iter().map(|id| Relation::new(*id)).collect(),
        }
    }

    #[test]
    fn deletes_run_before_upserts() {
        let mut t = transport_with(&["old"]);
        apply(&mut t, &owner(), &plan(&["old"], &["new"]), false).unwrap();
        assert!(matches!(t.calls()[0], Call::Delete { .. }));
        assert!(matches!(t.calls()[1], Call::Upsert { .. }));
    }

    #[test]
    fn delete_of_absent_target_is_success() {
        let mut t = transport_with(&[]);
        let outcomes = apply(&mut t, &owner(), &plan(&["ghost"], &[]), false).unwrap();
        assert_eq!(
            outcomes,
            vec![ApplyOutcome::AlreadyAbsent {
                target_id: TargetId::from("ghost")
            }]
        );
    }

    #[test]
    fn delete_failure_names_target_and_op() {
        let mut t = transport_with(&["a"]);
        t.fail_on(
            OpKind::Delete,
            "a",
            TransportError::Rejected {
                status: 403,
                message: "forbidden".into(),
            },
        );
        let err = apply(&mut t, &owner(), &plan(&["a"], &["b"]), false).unwrap_err();
        match err {
            SyncError::Transport { op, target_id, .. } => {
                assert_eq!(op, OpKind::Delete);
                assert_eq!(target_id, TargetId::from("a"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(t.calls().len(), 1, "upserts must not run after a failed delete");
    }

    #[test]
    fn upsert_to_missing_owner_is_fatal() {
        let mut t = MemoryTransport::new();
        let err = apply(&mut t, &owner(), &plan(&[], &["a"]), false).unwrap_err();
        assert!(matches!(
            err,
            SyncError::Transport {
                op: OpKind::Upsert,
                source: TransportError::NotFound,
                ..
            }
        ));
    }

    #[test]
    fn dry_run_makes_no_calls() {
        let mut t = transport_with(&["old"]);
        let outcomes = apply(&mut t, &owner(), &plan(&["old"], &["new"]), true).unwrap();
        assert!(t.calls().is_empty(), "dry-run must not reach the transport");
        assert!(matches!(outcomes[0], ApplyOutcome::WouldDelete { .. }));
        assert!(matches!(outcomes[1], ApplyOutcome::WouldUpsert { .. }));
        assert_eq!(t.relations(&owner()).unwrap().len(), 1);
    }
}
