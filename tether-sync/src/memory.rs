//! In-memory [`Transport`] that behaves like a remote relation store.
//!
//! Used by tests and by the CLI's file-fixture remote. It can:
//! - compact explicit priorities to `1..n` after every upsert, preserving
//!   relative order (ties keep insertion order), as many remote APIs do
//! - pin a target's confirmed priority regardless of what was requested
//! - fail a chosen operation on a chosen target
//! - record every call for later assertions

use std::collections::{BTreeMap, HashMap};

use tether_core::{OrderValue, OwnerId, Relation, TargetId};

use crate::error::{OpKind, TransportError};
use crate::transport::Transport;

/// One recorded transport call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Upsert { owner: OwnerId, target_id: TargetId },
    Delete { owner: OwnerId, target_id: TargetId },
    List { owner: OwnerId },
}

#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    owners: BTreeMap<String, Vec<Relation>>,
    compact_priorities: bool,
    pinned: HashMap<TargetId, i64>,
    /// Priority last asked for per `(owner, target)`; compaction ranks by this.
    requested: HashMap<(String, TargetId), i64>,
    failures: HashMap<(OpKind, TargetId), TransportError>,
    calls: Vec<Call>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a snapshot of `owner → relations`.
    pub fn from_snapshot(owners: BTreeMap<String, Vec<Relation>>) -> Self {
        Self {
            owners,
            ..Self::default()
        }
    }

    /// Current `owner → relations` state.
    pub fn snapshot(&self) -> &BTreeMap<String, Vec<Relation>> {
        &self.owners
    }

    /// Re-sequence explicit priorities to `1..n` after each upsert.
    pub fn with_compaction(mut self) -> Self {
        self.compact_priorities = true;
        self
    }

    /// Register an owner with no relations.
    pub fn add_owner(&mut self, owner: &OwnerId) {
        self.owners.entry(owner.0.clone()).or_default();
    }

    /// Insert a relation directly, bypassing the call log (out-of-band change).
    pub fn seed(&mut self, owner: &OwnerId, relation: Relation) {
        self.record_request(owner, &relation);
        let entries = self.owners.entry(owner.0.clone()).or_default();
        match entries.iter_mut().find(|r| r.target_id == relation.target_id) {
            Some(existing) => *existing = relation,
            None => entries.push(relation),
        }
    }

    /// Always confirm `value` as the priority of `target_id`, whatever was requested.
    pub fn pin_ordering(&mut self, target_id: impl Into<TargetId>, value: i64) {
        self.pinned.insert(target_id.into(), value);
    }

    /// Make every `op` on `target_id` fail with `error`.
    pub fn fail_on(&mut self, op: OpKind, target_id: impl Into<TargetId>, error: TransportError) {
        self.failures.insert((op, target_id.into()), error);
    }

    pub fn relations(&self, owner: &OwnerId) -> Option<&[Relation]> {
        self.owners.get(&owner.0).map(Vec::as_slice)
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    fn record_request(&mut self, owner: &OwnerId, relation: &Relation) {
        let key = (owner.0.clone(), relation.target_id.clone());
        match relation.ordering.explicit() {
            Some(value) => self.requested.insert(key, value),
            None => self.requested.remove(&key),
        };
    }

    fn injected(&self, op: OpKind, target_id: &TargetId) -> Result<(), TransportError> {
        match self.failures.get(&(op, target_id.clone())) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl Transport for MemoryTransport {
    fn create_or_update(
        &mut self,
        owner: &OwnerId,
        relation: &Relation,
    ) -> Result<(), TransportError> {
        self.calls.push(Call::Upsert {
            owner: owner.clone(),
            target_id: relation.target_id.clone(),
        });
        self.injected(OpKind::Upsert, &relation.target_id)?;

        if !self.owners.contains_key(&owner.0) {
            return Err(TransportError::NotFound);
        }
        self.record_request(owner, relation);

        let mut stored = relation.clone();
        if let Some(value) = self.pinned.get(&relation.target_id) {
            stored.ordering = OrderValue::Explicit(*value);
        }

        let entries = self
            .owners
            .get_mut(&owner.0)
            .ok_or(TransportError::NotFound)?;
        match entries.iter_mut().find(|r| r.target_id == stored.target_id) {
            Some(existing) => *existing = stored,
            None => entries.push(stored),
        }
        if self.compact_priorities {
            compact(owner, entries, &self.requested, &self.pinned);
        }
        Ok(())
    }

    fn delete(&mut self, owner: &OwnerId, target_id: &TargetId) -> Result<(), TransportError> {
        self.calls.push(Call::Delete {
            owner: owner.clone(),
            target_id: target_id.clone(),
        });
        self.injected(OpKind::Delete, target_id)?;

        let entries = self
            .owners
            .get_mut(&owner.0)
            .ok_or(TransportError::NotFound)?;
        let before = entries.len();
        entries.retain(|r| &r.target_id != target_id);
        if entries.len() == before {
            return Err(TransportError::NotFound);
        }
        self.requested.remove(&(owner.0.clone(), target_id.clone()));
        Ok(())
    }

    fn list_all(&mut self, owner: &OwnerId) -> Result<Vec<Relation>, TransportError> {
        self.calls.push(Call::List {
            owner: owner.clone(),
        });
        self.owners
            .get(&owner.0)
            .cloned()
            .ok_or(TransportError::NotFound)
    }
}

/// Renumber explicit priorities to `1..n` by (requested value, position).
/// Entries with no recorded request rank by their stored value. Pinned
/// targets keep their pinned value and do not take a slot.
fn compact(
    owner: &OwnerId,
    entries: &mut [Relation],
    requested: &HashMap<(String, TargetId), i64>,
    pinned: &HashMap<TargetId, i64>,
) {
    let mut ranked: Vec<(i64, usize)> = entries
        .iter()
        .enumerate()
        .filter(|(_, r)| !pinned.contains_key(&r.target_id))
        .filter_map(|(idx, r)| {
            let stored = r.ordering.explicit()?;
            let key = (owner.0.clone(), r.target_id.clone());
            Some((requested.get(&key).copied().unwrap_or(stored), idx))
        })
        .collect();
    ranked.sort();
    for (rank, (_, idx)) in ranked.into_iter().enumerate() {
        entries[idx].ordering = OrderValue::Explicit(rank as i64 + 1);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
