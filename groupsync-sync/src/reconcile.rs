//! Batched application of a [`SyncDelta`] to the remote group.
//!
//! Additions go out before removals so a member being replaced never leaves
//! the group transiently empty. Every batch is attempted exactly once and is
//! followed by a pacing pause. A non-success status is recorded and the run
//! moves on; only a call that fails to complete aborts the group.

use std::fmt;

use groupsync_core::{GroupMapping, MemberId};

use crate::diff::SyncDelta;
use crate::error::{BatchOp, SyncError};
use crate::pacing::Pacer;
use crate::source::MembershipApi;

/// Per-request member limit of the remote API.
pub const BATCH_SIZE: usize = 50;

/// One completed batch call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub op: BatchOp,
    pub remote_group: String,
    pub local_group: String,
    /// Offset of the batch's first member within its set.
    pub start: usize,
    /// `start + BATCH_SIZE`, regardless of how full the batch is.
    pub end: usize,
    pub members: Vec<MemberId>,
    pub status: u16,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "STATUS: {} ({}, {}) CHUNK ({}, {}) {}",
            self.op, self.remote_group, self.local_group, self.start, self.end, self.status
        )
    }
}

/// Issues add and remove batches for one group.
pub struct Reconciler<'a> {
    api: &'a dyn MembershipApi,
    pacer: &'a mut dyn Pacer,
}

impl<'a> Reconciler<'a> {
    pub fn new(api: &'a dyn MembershipApi, pacer: &'a mut dyn Pacer) -> Self {
        Self { api, pacer }
    }

    /// Apply `delta` to `mapping.remote_group`.
    ///
    /// Completed batches are appended to `batches` and passed to `on_batch`
    /// as they finish, so a caller still sees them when a later batch fails.
    pub fn apply(
        &mut self,
        mapping: &GroupMapping,
        delta: &SyncDelta,
        batches: &mut Vec<BatchReport>,
        on_batch: &mut dyn FnMut(&BatchReport),
    ) -> Result<(), SyncError> {
        self.apply_op(BatchOp::Add, mapping, &delta.to_add, batches, on_batch)?;
        self.apply_op(BatchOp::Remove, mapping, &delta.to_remove, batches, on_batch)
    }

    fn apply_op(
        &mut self,
        op: BatchOp,
        mapping: &GroupMapping,
        members: &[MemberId],
        batches: &mut Vec<BatchReport>,
        on_batch: &mut dyn FnMut(&BatchReport),
    ) -> Result<(), SyncError> {
        let group = mapping.remote_group.as_str();

        for (index, chunk) in members.chunks(BATCH_SIZE).enumerate() {
            let start = index * BATCH_SIZE;
            tracing::info!("{op} {} members to {group} (offset {start})", chunk.len());

            let result = match op {
                BatchOp::Add => self.api.add_members(group, chunk),
                BatchOp::Remove => self.api.remove_members(group, chunk),
            };
            self.pacer.pause();

            let status = result.map_err(|source| SyncError::BatchApply {
                op,
                group: group.to_string(),
                source,
            })?;

            let report = BatchReport {
                op,
                remote_group: mapping.remote_group.clone(),
                local_group: mapping.local_group.clone(),
                start,
                end: start + BATCH_SIZE,
                members: chunk.to_vec(),
                status,
            };
            if !report.is_success() {
                tracing::warn!("{op} batch for {group} at offset {start} returned HTTP {status}");
            }
            on_batch(&report);
            batches.push(report);
        }
        Ok(())
    }
}
