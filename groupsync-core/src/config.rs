//! YAML configuration.
//!
//! ```yaml
//! gws_base_url: https://groups.uw.edu/group_sws/v3
//! gws_ca_cert: /etc/groups_sync/ca.pem
//! gws_client_cert: /etc/groups_sync/client.pem
//! gws_client_key: /etc/groups_sync/client.key
//! pacing_interval_ms: 1000      # optional
//! gws_timeout_secs: 30          # optional
//! on_group_failure: abort_run   # optional: abort_run | skip_group
//! group_map:
//!   u_dept_staff: staff
//!   u_dept_admins: wheel
//! ```
//!
//! `group_map` is read in file order; that order is the processing order.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::GroupMapping;

/// Name of the config file looked up next to the executable.
pub const DEFAULT_CONFIG_RELATIVE: &str = "conf/groups_sync.yml";

/// Default pause after each batch call.
pub const DEFAULT_PACING_INTERVAL_MS: u64 = 1000;

/// What to do when one group's fetch or batch-apply fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the whole run at the first fatal group error.
    #[default]
    AbortRun,
    /// Record the failure and continue with the next group.
    SkipGroup,
}

/// Connection and mapping settings, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    pub gws_base_url: String,
    pub gws_ca_cert: PathBuf,
    pub gws_client_cert: PathBuf,
    pub gws_client_key: PathBuf,
    #[serde(deserialize_with = "deserialize_group_map")]
    pub group_map: Vec<GroupMapping>,
    #[serde(default = "default_pacing_interval_ms")]
    pub pacing_interval_ms: u64,
    #[serde(default)]
    pub gws_timeout_secs: Option<u64>,
    #[serde(default)]
    pub on_group_failure: FailurePolicy,
}

fn default_pacing_interval_ms() -> u64 {
    DEFAULT_PACING_INTERVAL_MS
}

impl Config {
    /// Parse and validate a config from YAML text.
    ///
    /// `path` is only used for error context.
    pub fn from_yaml(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn pacing_interval(&self) -> Duration {
        Duration::from_millis(self.pacing_interval_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.gws_timeout_secs.map(Duration::from_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.gws_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("gws_base_url is empty".into()));
        }
        for mapping in &self.group_map {
            if mapping.remote_group.is_empty() || mapping.local_group.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "group_map entry '{mapping}' has an empty group name"
                )));
            }
        }
        Ok(())
    }
}

/// Load the config at `path`.
///
/// Returns `ConfigError::NotFound` if absent, `ConfigError::Parse` (with
/// path + line context) if malformed YAML.
pub fn load_at(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path)?;
    Config::from_yaml(&contents, path)
}

/// `<dir of executable>/conf/groups_sync.yml`.
pub fn default_path() -> Result<PathBuf, ConfigError> {
    let exe = std::env::current_exe()?;
    let dir = exe
        .parent()
        .ok_or_else(|| ConfigError::Invalid("executable has no parent directory".into()))?;
    Ok(dir.join(DEFAULT_CONFIG_RELATIVE))
}

// ---------------------------------------------------------------------------
// group_map: ordered mapping -> Vec<GroupMapping>
// ---------------------------------------------------------------------------

fn deserialize_group_map<'de, D>(deserializer: D) -> Result<Vec<GroupMapping>, D::Error>
where
    D: Deserializer<'de>,
{
    struct GroupMapVisitor;

    impl<'de> Visitor<'de> for GroupMapVisitor {
        type Value = Vec<GroupMapping>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a mapping of remote group name to local group name")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut out: Vec<GroupMapping> = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((remote, local)) = map.next_entry::<String, String>()? {
                if out.iter().any(|m| m.remote_group == remote) {
                    return Err(de::Error::custom(format!(
                        "duplicate remote group '{remote}' in group_map"
                    )));
                }
                out.push(GroupMapping::new(remote, local));
            }
            Ok(out)
        }
    }

    deserializer.deserialize_map(GroupMapVisitor)
}
