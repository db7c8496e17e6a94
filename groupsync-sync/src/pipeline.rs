//! Sync pipeline entrypoint: every configured group, in order.
//!
//! Per group: fetch remote, fetch local, diff, then apply additions and
//! removals. An empty delta skips the apply step entirely.

use std::fmt;

use groupsync_core::{Config, FailurePolicy, GroupMapping};

use crate::diff::diff;
use crate::error::{BatchOp, SyncError};
use crate::pacing::Pacer;
use crate::reconcile::{BatchReport, Reconciler};
use crate::source::{fetch_local_members, fetch_remote_members, LocalGroupSource, MembershipApi};

/// Options for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunOptions {
    pub policy: FailurePolicy,
    /// Compute deltas but issue no add/remove calls.
    pub dry_run: bool,
}

impl RunOptions {
    pub fn from_config(config: &Config, dry_run: bool) -> Self {
        Self {
            policy: config.on_group_failure,
            dry_run,
        }
    }
}

/// Result of processing one group mapping.
#[derive(Debug)]
pub struct SyncOutcome {
    pub mapping: GroupMapping,
    /// Size of the add set, once the delta is known.
    pub to_add: usize,
    /// Size of the remove set, once the delta is known.
    pub to_remove: usize,
    pub batches: Vec<BatchReport>,
    /// Set when the group stopped early.
    pub error: Option<SyncError>,
    pub dry_run: bool,
}

impl SyncOutcome {
    fn new(mapping: &GroupMapping, dry_run: bool) -> Self {
        Self {
            mapping: mapping.clone(),
            to_add: 0,
            to_remove: 0,
            batches: Vec::new(),
            error: None,
            dry_run,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.error.is_some()
    }

    /// Members carried by issued batches of `op`.
    pub fn applied(&self, op: BatchOp) -> usize {
        self.batches
            .iter()
            .filter(|b| b.op == op)
            .map(|b| b.members.len())
            .sum()
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dry_run {
            write!(f, "[dry-run] ")?;
        }
        write!(
            f,
            "UWGROUP: {} LGROUP: {} ADD: {} REM: {}",
            self.mapping.remote_group, self.mapping.local_group, self.to_add, self.to_remove
        )
    }
}

/// Progress notifications, delivered as they happen.
#[derive(Debug, Clone, Copy)]
pub enum SyncEvent<'a> {
    Batch(&'a BatchReport),
    /// A group finished, changed or not.
    Group(&'a SyncOutcome),
    /// A group stopped on a fatal error.
    Fatal(&'a SyncOutcome),
}

/// Everything a run produced.
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<SyncOutcome>,
    /// True when a fatal error stopped the run before every group was visited.
    pub aborted: bool,
}

impl RunReport {
    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(SyncOutcome::is_fatal)
    }
}

/// Run the sync pipeline over `config.group_map`.
pub fn run(
    config: &Config,
    api: &dyn MembershipApi,
    local: &dyn LocalGroupSource,
    pacer: &mut dyn Pacer,
    options: RunOptions,
    mut on_event: impl FnMut(SyncEvent<'_>),
) -> RunReport {
    let mut report = RunReport::default();

    for (index, mapping) in config.group_map.iter().enumerate() {
        let outcome = sync_group(api, local, pacer, mapping, options, &mut on_event);

        if outcome.is_fatal() {
            on_event(SyncEvent::Fatal(&outcome));
            let remaining = config.group_map.len() - index - 1;
            report.outcomes.push(outcome);
            if options.policy == FailurePolicy::AbortRun {
                if remaining > 0 {
                    tracing::error!("aborting run; {remaining} group(s) not processed");
                }
                report.aborted = remaining > 0;
                break;
            }
            continue;
        }

        on_event(SyncEvent::Group(&outcome));
        report.outcomes.push(outcome);
    }

    report
}

/// Process a single mapping. Errors are captured in the outcome.
pub fn sync_group(
    api: &dyn MembershipApi,
    local: &dyn LocalGroupSource,
    pacer: &mut dyn Pacer,
    mapping: &GroupMapping,
    options: RunOptions,
    on_event: &mut dyn FnMut(SyncEvent<'_>),
) -> SyncOutcome {
    let mut outcome = SyncOutcome::new(mapping, options.dry_run);

    let fetched = fetch_remote_members(api, &mapping.remote_group).and_then(|remote| {
        fetch_local_members(local, &mapping.local_group).map(|local| (remote, local))
    });
    let (remote, local) = match fetched {
        Ok(sets) => sets,
        Err(err) => {
            tracing::error!("{mapping}: {err}");
            outcome.error = Some(err);
            return outcome;
        }
    };

    let delta = diff(&local, &remote);
    outcome.to_add = delta.to_add.len();
    outcome.to_remove = delta.to_remove.len();
    tracing::debug!(
        "{mapping}: {} to add, {} to remove",
        outcome.to_add,
        outcome.to_remove
    );

    if delta.is_empty() || options.dry_run {
        return outcome;
    }

    let result = Reconciler::new(api, pacer).apply(
        mapping,
        &delta,
        &mut outcome.batches,
        &mut |batch| on_event(SyncEvent::Batch(batch)),
    );
    if let Err(err) = result {
        tracing::error!("{mapping}: {err}");
        outcome.error = Some(err);
    }
    outcome
}
