//! Governance configuration (`devops-config.json`).
//!
//! ```json
//! {
//!   "governance": {
//!     "enabled": true,
//!     "freeze_windows": [{ "day": "Friday", "start": "17:00", "end": "23:59" }],
//!     "plugin_whitelist": ["sfdx-hardis@^4.0.0", "@salesforce/plugin-deploy-retrieve"]
//!   },
//!   "runtime": { "cli_version": "latest", "node_version": "20" }
//! }
//! ```
//!
//! A missing file is not an error: [`ConfigStore::load`] falls back to a
//! permissive policy with governance disabled and logs a warning. A file that
//! exists but does not parse or validate is always fatal.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, warn};

use crate::error::{GovernanceError, GovernanceResult};

/// Config file name, resolved against the workspace root.
pub const CONFIG_FILE_NAME: &str = "devops-config.json";

/// Message logged when the default unsafe policy is in effect.
pub const DEFAULT_POLICY_WARNING: &str =
    "No devops-config.json found. Using default unsafe policy.";

const DEFAULT_CLI_VERSION: &str = "latest";
const DEFAULT_NODE_VERSION: &str = "20";

/// Day of the week, spelled exactly as in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
            Self::Sunday => "Sunday",
        }
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Self::Monday,
            chrono::Weekday::Tue => Self::Tuesday,
            chrono::Weekday::Wed => Self::Wednesday,
            chrono::Weekday::Thu => Self::Thursday,
            chrono::Weekday::Fri => Self::Friday,
            chrono::Weekday::Sat => Self::Saturday,
            chrono::Weekday::Sun => Self::Sunday,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Zero-padded `HH:MM` time of day.
///
/// Ordering is (hour, minute), which matches the ordering of the fixed-width
/// string form for every value the pattern admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

fn time_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]{2}:[0-9]{2}$").expect("static regex"))
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Self {
        Self { hour, minute }
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Parse a `HH:MM` string.
    pub fn parse(value: &str) -> Result<Self, String> {
        if !time_pattern().is_match(value) {
            return Err(format!("invalid time '{}': expected HH:MM", value));
        }
        let (hour, minute) = value
            .split_once(':')
            .ok_or_else(|| format!("invalid time '{}': expected HH:MM", value))?;
        let hour = hour
            .parse()
            .map_err(|e| format!("invalid hour in '{}': {}", value, e))?;
        let minute = minute
            .parse()
            .map_err(|e| format!("invalid minute in '{}': {}", value, e))?;
        Ok(Self { hour, minute })
    }
}

impl FromStr for TimeOfDay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// A day-of-week interval during which deployments are blocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreezeWindow {
    pub day: Weekday,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

/// `governance` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freeze_windows: Option<Vec<FreezeWindow>>,

    /// Plugin identifiers, optionally suffixed with `@<constraint>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_whitelist: Option<Vec<String>>,
}

fn default_enabled() -> bool {
    true
}

/// `runtime` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeSettings {
    #[serde(default = "default_cli_version")]
    pub cli_version: String,

    #[serde(default = "default_node_version")]
    pub node_version: String,
}

fn default_cli_version() -> String {
    DEFAULT_CLI_VERSION.to_string()
}

fn default_node_version() -> String {
    DEFAULT_NODE_VERSION.to_string()
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            cli_version: default_cli_version(),
            node_version: default_node_version(),
        }
    }
}

/// Immutable governance configuration, loaded once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    pub governance: GovernanceSettings,
    pub runtime: RuntimeSettings,
}

impl ProtocolConfig {
    /// Permissive fallback used when no config file exists.
    pub fn default_unsafe() -> Self {
        Self {
            governance: GovernanceSettings {
                enabled: false,
                freeze_windows: None,
                plugin_whitelist: None,
            },
            runtime: RuntimeSettings::default(),
        }
    }

    /// Parse and validate config JSON.
    pub fn from_json(content: &str) -> GovernanceResult<Self> {
        serde_json::from_str(content).map_err(|e| GovernanceError::invalid_policy(e.to_string()))
    }

    /// Configured freeze windows, empty when absent.
    pub fn freeze_windows(&self) -> &[FreezeWindow] {
        self.governance.freeze_windows.as_deref().unwrap_or(&[])
    }

    /// Configured whitelist entries, empty when absent.
    pub fn plugin_whitelist(&self) -> &[String] {
        self.governance.plugin_whitelist.as_deref().unwrap_or(&[])
    }
}

/// Where a loaded config came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    DefaultUnsafe,
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: ProtocolConfig,
    pub source: ConfigSource,
}

impl LoadedConfig {
    pub fn is_default_unsafe(&self) -> bool {
        self.source == ConfigSource::DefaultUnsafe
    }
}

/// Loads the governance config from disk.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store reading `devops-config.json` under the given workspace root.
    pub fn in_workspace(root: impl AsRef<Path>) -> Self {
        Self::new(root.as_ref().join(CONFIG_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the config, falling back to the default unsafe policy when the
    /// file does not exist.
    pub fn load(&self) -> GovernanceResult<ProtocolConfig> {
        self.load_with_source().map(|loaded| loaded.config)
    }

    /// Like [`ConfigStore::load`], but also reports whether the fallback was used.
    pub fn load_with_source(&self) -> GovernanceResult<LoadedConfig> {
        if !self.path.exists() {
            warn!(path = %self.path.display(), "{}", DEFAULT_POLICY_WARNING);
            return Ok(LoadedConfig {
                config: ProtocolConfig::default_unsafe(),
                source: ConfigSource::DefaultUnsafe,
            });
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| GovernanceError::invalid_policy(e.to_string()))?;
        let config = ProtocolConfig::from_json(&content)?;

        debug!(
            path = %self.path.display(),
            enabled = config.governance.enabled,
            freeze_windows = config.freeze_windows().len(),
            whitelist = config.plugin_whitelist().len(),
            "loaded governance config"
        );

        Ok(LoadedConfig {
            config,
            source: ConfigSource::File(self.path.clone()),
        })
    }
}
