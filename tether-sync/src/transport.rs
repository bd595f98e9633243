//! The transport seam: the only way the reconciler talks to the external system.
//!
//! Implementations perform one blocking remote call per method and own their
//! own timeouts. Upserts must be idempotent by target id.

use tether_core::{OwnerId, Relation, TargetId};

use crate::error::TransportError;

pub trait Transport {
    /// Create the relation, or overwrite ordering and payload if it exists.
    fn create_or_update(&mut self, owner: &OwnerId, relation: &Relation)
        -> Result<(), TransportError>;

    /// Remove the relation. Returns `TransportError::NotFound` if it is absent.
    fn delete(&mut self, owner: &OwnerId, target_id: &TargetId) -> Result<(), TransportError>;

    /// Every relation the owner currently has, including ones created out of band.
    /// Returns `TransportError::NotFound` if the owner itself does not exist.
    fn list_all(&mut self, owner: &OwnerId) -> Result<Vec<Relation>, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn create_or_update(
        &mut self,
        owner: &OwnerId,
        relation: &Relation,
    ) -> Result<(), TransportError> {
        (**self).create_or_update(owner, relation)
    }

    fn delete(&mut self, owner: &OwnerId, target_id: &TargetId) -> Result<(), TransportError> {
        (**self).delete(owner, target_id)
    }

    fn list_all(&mut self, owner: &OwnerId) -> Result<Vec<Relation>, TransportError> {
        (**self).list_all(owner)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn create_or_update(
        &mut self,
        owner: &OwnerId,
        relation: &Relation,
    ) -> Result<(), TransportError> {
        (**self).create_or_update(owner, relation)
    }

    fn delete(&mut self, owner: &OwnerId, target_id: &TargetId) -> Result<(), TransportError> {
        (**self).delete(owner, target_id)
    }

    fn list_all(&mut self, owner: &OwnerId) -> Result<Vec<Relation>, TransportError> {
        (**self).list_all(owner)
    }
}
