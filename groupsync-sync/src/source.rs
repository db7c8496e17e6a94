//! Read-only membership sources.
//!
//! [`MembershipApi`] and [`LocalGroupSource`] are the seams to the outside
//! world; [`fetch_remote_members`] and [`fetch_local_members`] turn their raw
//! answers into [`MembershipSet`] snapshots.

use serde::Deserialize;

use groupsync_core::{MemberId, MembershipSet};

use crate::error::{ApiError, LocalGroupError, SyncError};

/// Record `type` of a personal account in the remote API.
pub const PERSONAL_MEMBER_TYPE: &str = "uwnetid";

/// One entry from the remote member listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MemberRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

impl MemberRecord {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }
}

/// Remote group membership API.
///
/// `add_members` and `remove_members` return `Ok(status)` for any HTTP
/// response, success or not. `Err` means the call itself did not complete.
pub trait MembershipApi {
    fn list_members(&self, group: &str) -> Result<Vec<MemberRecord>, ApiError>;

    fn add_members(&self, group: &str, members: &[MemberId]) -> Result<u16, ApiError>;

    fn remove_members(&self, group: &str, members: &[MemberId]) -> Result<u16, ApiError>;
}

/// Authoritative local group membership.
pub trait LocalGroupSource {
    fn members(&self, group: &str) -> Result<MembershipSet, LocalGroupError>;
}

/// Current personal members of a remote group.
///
/// Records of other types, and ids that do not look like personal accounts,
/// are treated as absent.
pub fn fetch_remote_members(
    api: &dyn MembershipApi,
    group: &str,
) -> Result<MembershipSet, SyncError> {
    let records = api
        .list_members(group)
        .map_err(|source| SyncError::RemoteQuery {
            group: group.to_string(),
            source,
        })?;
    let total = records.len();

    let members: MembershipSet = records
        .into_iter()
        .filter(|r| r.kind == PERSONAL_MEMBER_TYPE)
        .filter(|r| MemberId::is_personal(&r.id))
        .map(|r| MemberId::from(r.id))
        .collect();

    tracing::debug!(
        "remote group {group}: {} of {total} records are personal members",
        members.len()
    );
    Ok(members)
}

/// Current members of a local group, unfiltered.
pub fn fetch_local_members(
    source: &dyn LocalGroupSource,
    group: &str,
) -> Result<MembershipSet, SyncError> {
    let members = source
        .members(group)
        .map_err(|source| SyncError::LocalQuery {
            group: group.to_string(),
            source,
        })?;
    tracing::debug!("local group {group}: {} members", members.len());
    Ok(members)
}
