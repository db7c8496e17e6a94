//! Domain types for group membership sync.
//!
//! A [`MembershipSet`] is a point-in-time snapshot of one group from one
//! source. It is built once per pass and never mutated afterwards.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Maximum length of a personal identifier.
pub const MAX_PERSONAL_ID_LEN: usize = 8;

/// A single member token, as reported by either membership source.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MemberId(pub String);

impl MemberId {
    /// Returns `true` iff `id` matches `^[a-z][a-z0-9]{0,7}$`.
    ///
    /// Entity accounts (machines, groups) share the remote namespace but
    /// never satisfy this shape, so they are never synced.
    pub fn is_personal(id: &str) -> bool {
        let bytes = id.as_bytes();
        match bytes.split_first() {
            Some((first, rest)) => {
                first.is_ascii_lowercase()
                    && rest.len() < MAX_PERSONAL_ID_LEN
                    && rest
                        .iter()
                        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
            }
            None => false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for MemberId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MemberId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Membership snapshot
// ---------------------------------------------------------------------------

/// Members of one group from one source.
///
/// Ordered so batching and output are deterministic between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipSet(BTreeSet<MemberId>);

impl MembershipSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &MemberId) -> bool {
        self.0.contains(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MemberId> {
        self.0.iter()
    }
}

impl FromIterator<MemberId> for MembershipSet {
    fn from_iter<I: IntoIterator<Item = MemberId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<&'a str> for MembershipSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(MemberId::from).collect())
    }
}

impl IntoIterator for MembershipSet {
    type Item = MemberId;
    type IntoIter = std::collections::btree_set::IntoIter<MemberId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a MembershipSet {
    type Item = &'a MemberId;
    type IntoIter = std::collections::btree_set::Iter<'a, MemberId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ---------------------------------------------------------------------------
// Group mapping
// ---------------------------------------------------------------------------

/// One remote group mirrored from one local group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMapping {
    pub remote_group: String,
    pub local_group: String,
}

impl GroupMapping {
    pub fn new(remote_group: impl Into<String>, local_group: impl Into<String>) -> Self {
        Self {
            remote_group: remote_group.into(),
            local_group: local_group.into(),
        }
    }
}

impl fmt::Display for GroupMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <- {}", self.remote_group, self.local_group)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("a")]
    #[case("ab")]
    #[case("bob")]
    #[case("abcdefgh")]
    #[case("j0hn")]
    #[case("z1234567")]
    fn personal_ids_accepted(#[case] id: &str) {
        assert!(MemberId::is_personal(id), "{id} should be accepted");
    }

    #[rstest]
    #[case("")]
    #[case("1abc")]
    #[case("abcdefghi")]
    #[case("carol999999")]
    #[case("Alice")]
    #[case("aLice")]
    #[case("a_b")]
    #[case("a-b")]
    #[case("a.b")]
    #[case("ab c")]
    #[case("ålice")]
    fn non_personal_ids_rejected(#[case] id: &str) {
        assert!(!MemberId::is_personal(id), "{id} should be rejected");
    }

    #[test]
    fn membership_set_dedups_and_orders() {
        let set: MembershipSet = ["carol", "alice", "bob", "alice"].into_iter().collect();
        assert_eq!(set.len(), 3);
        let ids: Vec<&str> = set.iter().map(MemberId::as_str).collect();
        assert_eq!(ids, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn group_mapping_display() {
        let m = GroupMapping::new("u_dept_staff", "staff");
        assert_eq!(m.to_string(), "u_dept_staff <- staff");
    }
}
