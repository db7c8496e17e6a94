//! Membership delta between a local and a remote snapshot.

use groupsync_core::{MemberId, MembershipSet};

/// Changes that make the remote group equal to the local one.
///
/// `to_add` and `to_remove` are always disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncDelta {
    pub to_add: Vec<MemberId>,
    pub to_remove: Vec<MemberId>,
}

impl SyncDelta {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// `to_add = local - remote`, `to_remove = remote - local`.
///
/// An empty `local` removes every remote member; that is not special-cased.
pub fn diff(local: &MembershipSet, remote: &MembershipSet) -> SyncDelta {
    let to_add = local
        .iter()
        .filter(|m| !remote.contains(m))
        .cloned()
        .collect();
    let to_remove = remote
        .iter()
        .filter(|m| !local.contains(m))
        .cloned()
        .collect();
    SyncDelta { to_add, to_remove }
}
