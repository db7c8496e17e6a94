//! Error types for groupsync-sync.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which membership mutation a batch carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchOp {
    Add,
    Remove,
}

impl fmt::Display for BatchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchOp::Add => write!(f, "ADD"),
            BatchOp::Remove => write!(f, "REMOVE"),
        }
    }
}

/// Failure talking to the remote membership API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never completed (DNS, TLS, connection reset, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// The response body could not be decoded.
    #[error("unparsable response: {0}")]
    Payload(String),
}

/// Failure reading a local group.
#[derive(Debug, Error)]
pub enum LocalGroupError {
    #[error("group does not exist")]
    NotFound,

    /// The lookup mechanism could not be run or exited abnormally.
    #[error("lookup unavailable: {0}")]
    Unavailable(String),

    #[error("malformed group record: {0}")]
    Malformed(String),
}

/// All errors that can arise from sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Could not read the remote group's members.
    #[error("error retrieving members of remote group '{group}': {source}")]
    RemoteQuery {
        group: String,
        #[source]
        source: ApiError,
    },

    /// Could not read the local group's members.
    #[error("error retrieving members of local group '{group}': {source}")]
    LocalQuery {
        group: String,
        #[source]
        source: LocalGroupError,
    },

    /// A batch call did not complete.
    #[error("error applying {op} batch to remote group '{group}': {source}")]
    BatchApply {
        op: BatchOp,
        group: String,
        #[source]
        source: ApiError,
    },

    /// Client certificate material could not be used.
    #[error("TLS setup failed for {path}: {reason}")]
    Tls { path: PathBuf, reason: String },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
