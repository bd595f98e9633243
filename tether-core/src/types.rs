//! Domain types for relation reconciliation.
//!
//! A [`Relation`] is one membership edge between an owner and a target. The
//! three collections differ in who produced them:
//! - [`DesiredSet`] — declared by the owner, validated on construction
//! - [`ActualSet`] — reported by the external system, taken as-is
//! - [`ObservedView`] — derived by reconciliation, handed back to the caller
//!
//! All collection types serialize through the wire codec in [`crate::codec`].

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codec::WireRelation;
use crate::document::Payload;
use crate::error::InputError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Identifier of the owning resource (the side that holds full ownership).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OwnerId(pub String);

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for OwnerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OwnerId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Identifier of a target entity, unique within a set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(pub String);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for TargetId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TargetId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// Tri-state ordering hint.
///
/// `Unset` means no ordering was asked for. `Explicit(0)` is a real value and
/// is never treated as `Unset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrderValue {
    #[default]
    Unset,
    Explicit(i64),
}

impl OrderValue {
    pub fn is_explicit(&self) -> bool {
        matches!(self, OrderValue::Explicit(_))
    }

    pub fn explicit(&self) -> Option<i64> {
        match self {
            OrderValue::Explicit(n) => Some(*n),
            OrderValue::Unset => None,
        }
    }
}

impl From<Option<i64>> for OrderValue {
    fn from(value: Option<i64>) -> Self {
        value.map_or(OrderValue::Unset, OrderValue::Explicit)
    }
}

impl fmt::Display for OrderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderValue::Unset => write!(f, "-"),
            OrderValue::Explicit(n) => write!(f, "{n}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Relation
// ---------------------------------------------------------------------------

/// One membership edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireRelation", into = "WireRelation")]
pub struct Relation {
    pub target_id: TargetId,
    pub ordering: OrderValue,
    pub payload: Payload,
}

impl Relation {
    pub fn new(target_id: impl Into<TargetId>) -> Self {
        Self {
            target_id: target_id.into(),
            ordering: OrderValue::Unset,
            payload: Payload::new(),
        }
    }

    pub fn with_ordering(mut self, ordering: i64) -> Self {
        self.ordering = OrderValue::Explicit(ordering);
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

/// Ordered declaration of the owner's intended membership.
///
/// Construction rejects empty and duplicate target ids.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Relation>", into = "Vec<Relation>")]
pub struct DesiredSet(Vec<Relation>);

impl DesiredSet {
    pub fn new(relations: Vec<Relation>) -> Result<Self, InputError> {
        let mut seen = HashSet::new();
        for (index, relation) in relations.iter().enumerate() {
            if relation.target_id.0.is_empty() {
                return Err(InputError::MissingTargetId { index });
            }
            if !seen.insert(&relation.target_id) {
                return Err(InputError::DuplicateTarget {
                    target_id: relation.target_id.0.clone(),
                });
            }
        }
        Ok(Self(relations))
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn relations(&self) -> &[Relation] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Relation> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, target_id: &TargetId) -> Option<&Relation> {
        self.0.iter().find(|r| &r.target_id == target_id)
    }

    pub fn contains(&self, target_id: &TargetId) -> bool {
        self.get(target_id).is_some()
    }
}

impl TryFrom<Vec<Relation>> for DesiredSet {
    type Error = InputError;

    fn try_from(relations: Vec<Relation>) -> Result<Self, Self::Error> {
        Self::new(relations)
    }
}

impl From<DesiredSet> for Vec<Relation> {
    fn from(set: DesiredSet) -> Self {
        set.0
    }
}

impl<'a> IntoIterator for &'a DesiredSet {
    type Item = &'a Relation;
    type IntoIter = std::slice::Iter<'a, Relation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Relations as currently reported by the external system, in reported order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActualSet(pub Vec<Relation>);

impl ActualSet {
    pub fn iter(&self) -> std::slice::Iter<'_, Relation> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Relation>> for ActualSet {
    fn from(relations: Vec<Relation>) -> Self {
        Self(relations)
    }
}

/// Reconciled relations: matched entries in declared order, then drift.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObservedView(pub Vec<Relation>);

impl ObservedView {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn relations(&self) -> &[Relation] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Relation> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, target_id: &TargetId) -> Option<&Relation> {
        self.0.iter().find(|r| &r.target_id == target_id)
    }

    pub fn target_ids(&self) -> impl Iterator<Item = &TargetId> {
        self.0.iter().map(|r| &r.target_id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
