//! # tether-sync
//!
//! Relation reconciliation against an external source of truth.
//!
//! Use a [`Reconciler`] with any [`Transport`] to run a cycle for one owner,
//! or [`pipeline::run`] to do the same with per-owner state persisted under a
//! home directory.

pub mod apply;
pub mod diff;
pub mod error;
pub mod memory;
pub mod ordering;
pub mod pipeline;
pub mod reconciler;
pub mod state_store;
pub mod transport;
pub mod view;

pub use apply::ApplyOutcome;
pub use diff::{diff, Plan};
pub use error::{OpKind, SyncError, TransportError};
pub use memory::MemoryTransport;
pub use ordering::{OrderingMismatch, OrderingReport};
pub use reconciler::{Reconciler, Reconciliation};
pub use transport::Transport;
pub use view::ViewBuild;
