//! Reconciler: the diff → apply → re-fetch → build cycle for one owner.
//!
//! The transport is injected at construction; the reconciler keeps no other
//! state and never caches the remote relation set between calls. Methods take
//! `&mut self`: one reconciler drives one owner at a time, and callers must
//! not run overlapping cycles against the same owner.

use tether_core::{ActualSet, DesiredSet, ObservedView, OwnerId, TargetId};

use crate::apply::{self, ApplyOutcome};
use crate::diff;
use crate::error::{SyncError, TransportError};
use crate::ordering::{self, OrderingReport};
use crate::transport::Transport;
use crate::view;

/// Result of [`Reconciler::reconcile`] and [`Reconciler::read`].
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub owner: OwnerId,
    /// Remote operations performed (empty for reads).
    pub applied: Vec<ApplyOutcome>,
    pub view: ObservedView,
    /// Targets present remotely but not declared.
    pub drift: Vec<TargetId>,
    /// Declared targets that are not present remotely.
    pub dropped: Vec<TargetId>,
    /// Advisory ordering diagnostics; never turns into an error.
    pub ordering: OrderingReport,
}

pub struct Reconciler<T> {
    transport: T,
    dry_run: bool,
}

impl<T: Transport> Reconciler<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            dry_run: false,
        }
    }

    /// In dry-run mode no remote mutation is made; the view reflects the
    /// current remote state.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Converge `owner` onto `desired`.
    ///
    /// `previous` is the declaration applied last time (empty on first run);
    /// entries it has and `desired` lacks are deleted. `prior_view` is the
    /// view returned last time, used for payload field tracking.
    pub fn reconcile(
        &mut self,
        owner: &OwnerId,
        previous: &DesiredSet,
        desired: &DesiredSet,
        prior_view: &ObservedView,
    ) -> Result<Reconciliation, SyncError> {
        let plan = diff::diff(previous, desired);
        tracing::debug!(
            "{owner}: {} delete(s), {} upsert(s)",
            plan.to_delete.len(),
            plan.to_upsert.len()
        );
        let applied = apply::apply(&mut self.transport, owner, &plan, self.dry_run)?;

        let mut result = self.read(owner, desired, prior_view)?;
        result.applied = applied;
        Ok(result)
    }

    /// Fetch the remote set and build the view without mutating anything.
    pub fn read(
        &mut self,
        owner: &OwnerId,
        desired: &DesiredSet,
        prior_view: &ObservedView,
    ) -> Result<Reconciliation, SyncError> {
        let actual = self.fetch(owner)?;
        let built = view::build(desired, prior_view, &actual);
        let ordering = ordering::check(desired, &built.view);
        if !built.drift.is_empty() {
            tracing::info!(
                "{owner}: {} relation(s) exist remotely but are not declared",
                built.drift.len()
            );
        }

        Ok(Reconciliation {
            owner: owner.clone(),
            applied: Vec::new(),
            view: built.view,
            drift: built.drift,
            dropped: built.dropped,
            ordering,
        })
    }

    /// Delete every declared relation. Targets already gone are not an error.
    pub fn delete(
        &mut self,
        owner: &OwnerId,
        desired: &DesiredSet,
    ) -> Result<Vec<ApplyOutcome>, SyncError> {
        apply::delete_all(
            &mut self.transport,
            owner,
            desired.iter().map(|r| &r.target_id),
            self.dry_run,
        )
    }

    fn fetch(&mut self, owner: &OwnerId) -> Result<ActualSet, SyncError> {
        match self.transport.list_all(owner) {
            Ok(relations) => Ok(ActualSet::from(relations)),
            Err(TransportError::NotFound) => Err(SyncError::OwnerNotFound {
                owner: owner.clone(),
            }),
            Err(source) => Err(SyncError::List {
                owner: owner.clone(),
                source,
            }),
        }
    }
}
