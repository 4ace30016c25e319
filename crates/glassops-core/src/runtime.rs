//! Collaborator seams for the bootstrap and identity phases.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::inputs::AuthRequest;
use crate::plugin::PluginRef;

/// A plugin as reported by the installer's post-install listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPlugin {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// Installs the deployment CLI and its plugins.
#[async_trait]
pub trait RuntimeInstaller: Send + Sync {
    /// Make sure the CLI binary is present at `version`.
    async fn ensure_cli(&self, version: &str) -> anyhow::Result<()>;

    /// Install one plugin (`name` or `name@constraint`).
    async fn install_plugin(&self, plugin: &PluginRef) -> anyhow::Result<()>;

    /// Plugins currently installed.
    async fn installed_plugins(&self) -> anyhow::Result<Vec<InstalledPlugin>>;

    fn name(&self) -> &'static str;
}

/// Authenticates against the identity provider.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Returns the organization identifier on success.
    async fn authenticate(&self, request: &AuthRequest) -> anyhow::Result<String>;

    fn name(&self) -> &'static str;
}
