//! # groupsync-sync
//!
//! Membership diff and batched reconciliation against the Groups Web Service.
//!
//! Call [`pipeline::run`] with a loaded [`groupsync_core::Config`], a
//! [`MembershipApi`] (usually [`GwsClient`]), a [`LocalGroupSource`] (usually
//! [`Getent`]) and a [`pacing::Pacer`].

pub mod diff;
pub mod error;
pub mod getent;
pub mod gws;
pub mod pacing;
pub mod pipeline;
pub mod reconcile;
pub mod source;

pub use diff::{diff, SyncDelta};
pub use error::{ApiError, BatchOp, LocalGroupError, SyncError};
pub use getent::Getent;
pub use gws::GwsClient;
pub use pipeline::{RunOptions, RunReport, SyncEvent, SyncOutcome};
pub use reconcile::{BatchReport, Reconciler, BATCH_SIZE};
pub use source::{LocalGroupSource, MemberRecord, MembershipApi};
