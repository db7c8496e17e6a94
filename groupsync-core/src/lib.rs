//! groups-sync core library: domain types, configuration, errors.
//!
//! - [`types`]: member identifiers, membership snapshots, group mappings
//! - [`config`]: YAML config loading
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, FailurePolicy};
pub use error::ConfigError;
pub use types::{GroupMapping, MemberId, MembershipSet};
