//! Governance facade over config loading, freeze windows and the plugin whitelist.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::{ConfigStore, LoadedConfig, ProtocolConfig};
use crate::error::GovernanceResult;
use crate::freeze::{self, Clock, SystemClock};
use crate::plugin::{self, PluginRef};

/// One policy engine per run, shared by every phase.
#[derive(Clone)]
pub struct PolicyEngine {
    store: ConfigStore,
    clock: Arc<dyn Clock>,
}

impl PolicyEngine {
    pub fn new(store: ConfigStore) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
        }
    }

    /// Engine reading `devops-config.json` from the workspace root.
    pub fn for_workspace(root: impl AsRef<Path>) -> Self {
        Self::new(ConfigStore::in_workspace(root))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn load(&self) -> GovernanceResult<ProtocolConfig> {
        self.store.load()
    }

    pub fn load_with_source(&self) -> GovernanceResult<LoadedConfig> {
        self.store.load_with_source()
    }

    /// Freeze check against the engine's clock.
    pub fn check_freeze(&self, config: &ProtocolConfig) -> GovernanceResult<()> {
        freeze::check_freeze(config, self.clock.now())
    }

    pub fn is_plugin_allowed(&self, config: &ProtocolConfig, plugin_name: &str) -> bool {
        plugin::is_allowed(config, plugin_name)
    }

    pub fn plugin_version_constraint(
        &self,
        config: &ProtocolConfig,
        plugin_name: &str,
    ) -> Option<String> {
        plugin::version_constraint(config, plugin_name)
    }

    pub fn authorize_plugin(
        &self,
        config: &ProtocolConfig,
        plugin_name: &str,
    ) -> GovernanceResult<PluginRef> {
        plugin::authorize(config, plugin_name)
    }
}

impl std::fmt::Debug for PolicyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyEngine")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
