use anyhow::{Context, Result};
use async_trait::async_trait;
use glassops_core::{InstalledPlugin, PluginRef, RuntimeInstaller};
use serde_json::Value;
use tracing::info;

use super::exec;

const NPM_PACKAGE: &str = "@salesforce/cli";

/// Installs the Salesforce CLI through npm and plugins through `sf plugins`.
#[derive(Debug, Clone)]
pub struct SfInstaller {
    sf: String,
    npm: String,
}

impl Default for SfInstaller {
    fn default() -> Self {
        Self {
            sf: "sf".to_string(),
            npm: "npm".to_string(),
        }
    }
}

impl SfInstaller {
    pub fn new(sf: impl Into<String>, npm: impl Into<String>) -> Self {
        Self {
            sf: sf.into(),
            npm: npm.into(),
        }
    }

    async fn cli_present(&self) -> bool {
        exec::capture(&self.sf, ["--version"], None)
            .await
            .is_ok_and(|out| out.success())
    }
}

#[async_trait]
impl RuntimeInstaller for SfInstaller {
    async fn ensure_cli(&self, version: &str) -> Result<()> {
        if self.cli_present().await {
            info!(cli = %self.sf, "cli already installed");
        } else {
            let package = format!("{}@{}", NPM_PACKAGE, version);
            info!(package = %package, "installing cli");
            exec::checked(&self.npm, ["install", "-g", package.as_str()], None)
                .await
                .with_context(|| format!("failed to install {}", package))?;
        }

        let out = exec::checked(&self.sf, ["version"], None)
            .await
            .context("cli installed but `sf version` failed")?;
        info!(version = %out.stdout.trim(), "cli ready");
        Ok(())
    }

    async fn install_plugin(&self, plugin: &PluginRef) -> Result<()> {
        let spec = plugin.install_spec();
        // `sf plugins install` asks to confirm unsigned plugins.
        exec::checked(&self.sf, ["plugins", "install", spec.as_str()], Some("y\n"))
            .await
            .with_context(|| format!("failed to install plugin {}", spec))?;
        Ok(())
    }

    async fn installed_plugins(&self) -> Result<Vec<InstalledPlugin>> {
        let out = exec::checked(&self.sf, ["plugins", "--json"], None)
            .await
            .context("failed to list plugins")?;
        parse_plugin_listing(&out.stdout)
    }

    fn name(&self) -> &'static str {
        "sf"
    }
}

/// Accepts both `{"result": [...]}` and a bare array.
fn parse_plugin_listing(stdout: &str) -> Result<Vec<InstalledPlugin>> {
    let value: Value = serde_json::from_str(stdout).context("plugin listing is not JSON")?;
    let entries = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("result") {
            Some(Value::Array(items)) => items,
            _ => anyhow::bail!("plugin listing has no result array"),
        },
        _ => anyhow::bail!("unexpected plugin listing shape"),
    };

    entries
        .into_iter()
        .map(|entry| serde_json::from_value(entry).context("malformed plugin entry"))
        .collect()
}
