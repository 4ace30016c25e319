//! Plugin whitelist entries and resolution.
//!
//! A whitelist entry is a plugin identifier optionally pinned to a version
//! constraint:
//! - `sfdx-hardis` → any version
//! - `sfdx-hardis@^4.0.0` → constraint `^4.0.0`
//! - `@salesforce/plugin-deploy-retrieve` → scoped, any version
//! - `@salesforce/plugin-deploy-retrieve@latest` → scoped, constraint `latest`
//!
//! Membership is by exact name only. Constraints are opaque strings handed to
//! the installer as-is.

use std::fmt;

use crate::config::ProtocolConfig;
use crate::error::{GovernanceError, GovernanceResult};

/// A decomposed whitelist entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginRef {
    pub name: String,
    pub version_constraint: Option<String>,
}

impl PluginRef {
    /// Split an entry into name and constraint.
    ///
    /// Scoped entries (leading `@`) split on the last `@`; all others split
    /// on the first. A separator at position 0 never splits.
    ///
    /// ```
    /// use glassops_core::PluginRef;
    ///
    /// let scoped = PluginRef::parse("@scope/pkg@^1.2.3");
    /// assert_eq!(scoped.name, "@scope/pkg");
    /// assert_eq!(scoped.version_constraint.as_deref(), Some("^1.2.3"));
    ///
    /// let bare = PluginRef::parse("@scope/pkg");
    /// assert_eq!(bare.name, "@scope/pkg");
    /// assert!(bare.version_constraint.is_none());
    /// ```
    pub fn parse(entry: &str) -> Self {
        let split_at = if entry.starts_with('@') {
            entry.rfind('@')
        } else {
            entry.find('@')
        };

        match split_at {
            Some(pos) if pos > 0 => Self {
                name: entry[..pos].to_string(),
                version_constraint: Some(entry[pos + 1..].to_string()),
            },
            _ => Self {
                name: entry.to_string(),
                version_constraint: None,
            },
        }
    }

    /// Install specifier: `name@constraint` or bare `name`.
    pub fn install_spec(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PluginRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version_constraint {
            Some(constraint) => write!(f, "{}@{}", self.name, constraint),
            None => f.write_str(&self.name),
        }
    }
}

impl From<&str> for PluginRef {
    fn from(entry: &str) -> Self {
        Self::parse(entry)
    }
}

/// Whether a whitelist is configured at all.
pub fn has_whitelist(config: &ProtocolConfig) -> bool {
    !config.plugin_whitelist().is_empty()
}

fn find_entry(config: &ProtocolConfig, plugin_name: &str) -> Option<PluginRef> {
    config
        .plugin_whitelist()
        .iter()
        .map(|entry| PluginRef::parse(entry))
        .find(|entry| entry.name == plugin_name)
}

/// True when no whitelist is configured, or when an entry's name matches
/// `plugin_name` exactly.
pub fn is_allowed(config: &ProtocolConfig, plugin_name: &str) -> bool {
    !has_whitelist(config) || find_entry(config, plugin_name).is_some()
}

/// Constraint attached to the matching whitelist entry, if any.
pub fn version_constraint(config: &ProtocolConfig, plugin_name: &str) -> Option<String> {
    find_entry(config, plugin_name).and_then(|entry| entry.version_constraint)
}

/// Resolve what to install for `plugin_name`, failing closed when a
/// whitelist exists and does not list it.
pub fn authorize(config: &ProtocolConfig, plugin_name: &str) -> GovernanceResult<PluginRef> {
    if !is_allowed(config, plugin_name) {
        return Err(GovernanceError::PluginNotWhitelisted {
            plugin: plugin_name.to_string(),
            allowed: config.plugin_whitelist().join(", "),
        });
    }

    Ok(PluginRef {
        name: plugin_name.to_string(),
        version_constraint: version_constraint(config, plugin_name),
    })
}
