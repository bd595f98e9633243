//! tether core library — relation model, payload documents, codec, declarations.
//!
//! - [`types`] — newtypes, the tri-state [`OrderValue`], and relation collections
//! - [`document`] — [`Document`] / [`Payload`] values carried on each relation
//! - [`codec`] — wire shape ↔ [`Relation`]
//! - [`declaration`] — YAML declaration loading
//! - [`error`] — [`InputError`]

pub mod codec;
pub mod declaration;
pub mod document;
pub mod error;
pub mod types;

pub use codec::WireRelation;
pub use declaration::Declaration;
pub use document::{Document, Payload};
pub use error::InputError;
pub use types::{ActualSet, DesiredSet, ObservedView, OrderValue, OwnerId, Relation, TargetId};
