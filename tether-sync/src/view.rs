//! Reconciliation view builder.
//!
//! Merges the declaration with a freshly fetched actual set:
//!
//! 1. Matched entries, in declared order. `target_id` comes from the actual
//!    entry. Ordering is the confirmed value only when the declaration asked
//!    for one; an `Unset` declaration stays `Unset` so that no value the owner
//!    never tracked shows up as drift. The payload keeps the fields the owner
//!    has already been shown, refreshed with non-null confirmed values.
//! 2. Declared entries missing from the actual set are dropped.
//! 3. Actual entries that were not declared (drift) follow, in reported
//!    order, with confirmed ordering and their full payload.

use std::collections::{HashMap, HashSet};

use tether_core::{ActualSet, DesiredSet, ObservedView, OrderValue, Relation, TargetId};

/// Result of [`build`]: the view plus what was added or dropped relative to
/// the declaration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewBuild {
    pub view: ObservedView,
    /// Targets present remotely but not declared, in view order.
    pub drift: Vec<TargetId>,
    /// Declared targets that did not take effect remotely.
    pub dropped: Vec<TargetId>,
}

/// Build the observed view.
///
/// `prior` is the view the caller last persisted. Its payload for a target
/// defines which fields are tracked; a target with no prior entry is tracked
/// with the fields of its declared payload.
pub fn build(desired: &DesiredSet, prior: &ObservedView, actual: &ActualSet) -> ViewBuild {
    let mut index: HashMap<&TargetId, &Relation> = HashMap::with_capacity(actual.len());
    for relation in actual.iter() {
        index.entry(&relation.target_id).or_insert(relation);
    }

    let mut out = ViewBuild::default();
    let mut matched: HashSet<&TargetId> = HashSet::with_capacity(desired.len());

    for declared in desired {
        let Some(confirmed) = index.get(&declared.target_id) else {
            tracing::debug!("declared target not found remotely: {}", declared.target_id);
            out.dropped.push(declared.target_id.clone());
            continue;
        };
        matched.insert(&declared.target_id);

        let ordering = match declared.ordering {
            OrderValue::Explicit(_) => confirmed.ordering,
            OrderValue::Unset => OrderValue::Unset,
        };
        let tracked = prior
            .get(&declared.target_id)
            .map_or(&declared.payload, |seen| &seen.payload);

        out.view.0.push(Relation {
            target_id: confirmed.target_id.clone(),
            ordering,
            payload: tracked.refreshed_from(&confirmed.payload),
        });
    }

    for relation in actual.iter() {
        if !matched.insert(&relation.target_id) {
            continue;
        }
        tracing::debug!("drift: {} exists remotely but is not declared", relation.target_id);
        out.drift.push(relation.target_id.clone());
        out.view.0.push(relation.clone());
    }

    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
