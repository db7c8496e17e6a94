//! Local group lookup through NSS (`getent group <name>`).

use std::path::PathBuf;
use std::process::Command;

use groupsync_core::{MemberId, MembershipSet};

use crate::error::LocalGroupError;
use crate::source::LocalGroupSource;

/// `getent` exit status for "key not found".
const GETENT_NOT_FOUND: i32 = 2;

/// [`LocalGroupSource`] backed by the `getent` binary.
#[derive(Debug, Clone)]
pub struct Getent {
    program: PathBuf,
}

impl Default for Getent {
    fn default() -> Self {
        Self {
            program: PathBuf::from("getent"),
        }
    }
}

impl Getent {
    /// Use a specific `getent`-compatible executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl LocalGroupSource for Getent {
    fn members(&self, group: &str) -> Result<MembershipSet, LocalGroupError> {
        let output = Command::new(&self.program)
            .arg("group")
            .arg(group)
            .output()
            .map_err(|e| {
                LocalGroupError::Unavailable(format!("{}: {e}", self.program.display()))
            })?;

        match output.status.code() {
            Some(0) => {}
            Some(GETENT_NOT_FOUND) => return Err(LocalGroupError::NotFound),
            _ => {
                return Err(LocalGroupError::Unavailable(format!(
                    "{} exited with {}: {}",
                    self.program.display(),
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                )))
            }
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_group_record(&stdout)
    }
}

/// Parse `name:passwd:gid:member,member,...` into its member set.
///
/// Only the first line is read. An empty member field yields an empty set.
pub fn parse_group_record(record: &str) -> Result<MembershipSet, LocalGroupError> {
    let line = record.lines().next().unwrap_or("").trim();
    let fields: Vec<&str> = line.splitn(4, ':').collect();
    let [_name, _passwd, _gid, members] = fields.as_slice() else {
        return Err(LocalGroupError::Malformed(line.to_string()));
    };

    Ok(members
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(MemberId::from)
        .collect())
}
