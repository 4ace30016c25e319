//! Phase orchestrator.
//!
//! A run is a linear pipeline: Policy, Bootstrap, Identity, Contract. The
//! first failing phase ends the run; its error is tagged with the phase and a
//! stable code and handed back in the [`RunReport`]. [`Orchestrator::run`]
//! never returns an error itself.

mod phase;

pub use phase::{ErrorCode, Phase, PhaseError};

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::{ProtocolConfig, DEFAULT_POLICY_WARNING};
use crate::context::RunContext;
use crate::contract::{
    contract_timestamp, Audit, ContractMeta, ContractStatus, ContractValidator, Coverage,
    DeploymentContract, Quality, CONTRACT_FILE_NAME, CONTRACT_SCHEMA_VERSION,
};
use crate::error::GovernanceError;
use crate::inputs::{self, RunInputs, DEFAULT_COVERAGE_REQUIRED};
use crate::plugin;
use crate::policy::PolicyEngine;
use crate::runtime::{IdentityResolver, RuntimeInstaller};

/// Org id recorded when authentication is skipped.
pub const SKIP_AUTH_ORG_ID: &str = "00D000000000000";

const NO_WHITELIST_WARNING: &str =
    "No plugin whitelist configured. All plugins are allowed. Add governance.plugin_whitelist to devops-config.json.";

/// Values a run publishes to its caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunOutputs {
    pub runtime_id: String,
    pub is_locked: bool,
    pub org_id: Option<String>,
    pub contract_path: Option<PathBuf>,
    pub contract_digest: Option<String>,
    pub glassops_ready: bool,
}

impl RunOutputs {
    /// Outputs of a run that has not finished: a fresh runtime id, unlocked
    /// and not ready.
    pub fn pending() -> Self {
        Self {
            runtime_id: uuid::Uuid::new_v4().to_string(),
            ..Self::default()
        }
    }

    /// `key=value` pairs in publication order; unset values are omitted.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("runtime_id", self.runtime_id.clone()),
            ("is_locked", self.is_locked.to_string()),
        ];
        if let Some(org_id) = &self.org_id {
            pairs.push(("org_id", org_id.clone()));
        }
        if let Some(path) = &self.contract_path {
            pairs.push(("contract_path", path.display().to_string()));
        }
        if let Some(digest) = &self.contract_digest {
            pairs.push(("contract_digest", digest.clone()));
        }
        pairs.push(("glassops_ready", self.glassops_ready.to_string()));
        pairs
    }
}

/// Everything a run produced, successful or not.
#[derive(Debug)]
pub struct RunReport {
    pub outputs: RunOutputs,
    pub contract: Option<DeploymentContract>,
    pub completed: Vec<Phase>,
    pub warnings: Vec<String>,
    pub error: Option<PhaseError>,
}

impl RunReport {
    fn new(runtime_id: String) -> Self {
        Self {
            outputs: RunOutputs {
                runtime_id,
                ..RunOutputs::default()
            },
            contract: None,
            completed: Vec::new(),
            warnings: Vec::new(),
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// True when a freeze window blocked the run.
    pub fn is_blocked(&self) -> bool {
        self.error
            .as_ref()
            .is_some_and(PhaseError::is_freeze_violation)
    }

    pub fn failure_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }

    fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.warnings.push(message);
    }
}

/// Runs the governance phases against injected collaborators.
pub struct Orchestrator {
    policy: PolicyEngine,
    installer: Arc<dyn RuntimeInstaller>,
    identity: Arc<dyn IdentityResolver>,
    context: RunContext,
}

impl Orchestrator {
    pub fn new(
        policy: PolicyEngine,
        installer: Arc<dyn RuntimeInstaller>,
        identity: Arc<dyn IdentityResolver>,
        context: RunContext,
    ) -> Self {
        Self {
            policy,
            installer,
            identity,
            context,
        }
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }

    pub fn policy(&self) -> &PolicyEngine {
        &self.policy
    }

    /// Execute every phase in order, stopping at the first failure.
    pub async fn run(&self, inputs: &RunInputs) -> RunReport {
        self.run_with_id(uuid::Uuid::new_v4().to_string(), inputs).await
    }

    /// Like [`Orchestrator::run`], under a runtime id chosen by the caller.
    pub async fn run_with_id(
        &self,
        runtime_id: impl Into<String>,
        inputs: &RunInputs,
    ) -> RunReport {
        let mut report = RunReport::new(runtime_id.into());
        info!(
            runtime_id = %report.outputs.runtime_id,
            repository = %self.context.repository,
            actor = %self.context.actor,
            "starting governance run"
        );

        if let Some(message) = self.context.fork_warning() {
            report.warn(message);
        }

        if let Err(err) = self.run_phases(inputs, &mut report).await {
            error!(
                phase = %err.phase,
                code = %err.code,
                error = ?err.cause,
                "{}",
                err.message
            );
            report.outputs.glassops_ready = false;
            report.error = Some(err);
            return report;
        }

        report.outputs.glassops_ready = true;
        info!(
            runtime_id = %report.outputs.runtime_id,
            "governance run complete"
        );
        report
    }

    async fn run_phases(
        &self,
        inputs: &RunInputs,
        report: &mut RunReport,
    ) -> Result<(), PhaseError> {
        let config = self
            .policy_phase(inputs, report)
            .map_err(|e| PhaseError::new(Phase::Policy, e))?;
        report.completed.push(Phase::Policy);

        self.bootstrap_phase(&config, inputs, report)
            .await
            .map_err(|e| PhaseError::new(Phase::Bootstrap, e))?;
        report.completed.push(Phase::Bootstrap);

        let org_id = self
            .identity_phase(inputs, report)
            .await
            .map_err(|e| PhaseError::new(Phase::Identity, e))?;
        report.outputs.org_id = Some(org_id.clone());
        report.completed.push(Phase::Identity);

        self.contract_phase(&org_id, inputs, report)
            .await
            .map_err(|e| PhaseError::new(Phase::Contract, e))?;
        report.completed.push(Phase::Contract);

        Ok(())
    }

    fn policy_phase(
        &self,
        inputs: &RunInputs,
        report: &mut RunReport,
    ) -> anyhow::Result<ProtocolConfig> {
        let loaded = self.policy.load_with_source()?;
        if loaded.is_default_unsafe() {
            report.warnings.push(DEFAULT_POLICY_WARNING.to_string());
        }

        if inputs.enforce_policy {
            if let Err(e) = self.policy.check_freeze(&loaded.config) {
                report.outputs.is_locked = e.is_freeze_violation();
                return Err(e.into());
            }
        }

        report.outputs.is_locked = false;
        info!(enforced = inputs.enforce_policy, "policy check passed");
        Ok(loaded.config)
    }

    async fn bootstrap_phase(
        &self,
        config: &ProtocolConfig,
        inputs: &RunInputs,
        report: &mut RunReport,
    ) -> anyhow::Result<()> {
        let cli_version = &config.runtime.cli_version;
        info!(installer = self.installer.name(), version = %cli_version, "bootstrapping runtime");
        self.installer.ensure_cli(cli_version).await?;

        if inputs.plugins.is_empty() {
            info!("no plugins requested");
            return Ok(());
        }

        if !plugin::has_whitelist(config) {
            report.warn(NO_WHITELIST_WARNING);
        }

        for name in &inputs.plugins {
            let plugin = self.policy.authorize_plugin(config, name)?;
            info!(plugin = %plugin, "installing plugin");
            self.installer.install_plugin(&plugin).await?;

            let installed = self.installer.installed_plugins().await?;
            if !installed.iter().any(|p| p.name == plugin.name) {
                return Err(GovernanceError::PluginVerificationFailed {
                    plugin: plugin.name.clone(),
                }
                .into());
            }
            info!(plugin = %plugin.name, "plugin verified");
        }

        Ok(())
    }

    async fn identity_phase(
        &self,
        inputs: &RunInputs,
        report: &mut RunReport,
    ) -> anyhow::Result<String> {
        if inputs.skip_auth {
            report.warn(format!(
                "Authentication skipped; using placeholder org id {}",
                SKIP_AUTH_ORG_ID
            ));
            return Ok(SKIP_AUTH_ORG_ID.to_string());
        }

        let request = inputs.auth_request();
        request.validate()?;

        info!(
            resolver = self.identity.name(),
            username = %request.username,
            "authenticating"
        );
        let org_id = self.identity.authenticate(&request).await?;
        info!(org_id = %org_id, "authenticated");
        Ok(org_id)
    }

    async fn contract_phase(
        &self,
        org_id: &str,
        inputs: &RunInputs,
        report: &mut RunReport,
    ) -> anyhow::Result<()> {
        let tests = inputs::parse_test_results(inputs.test_results.as_deref());
        if let Some(message) = tests.warning {
            report.warnings.push(message);
        }

        let actual = inputs::parse_number(
            "coverage_percentage",
            inputs.coverage_percentage.as_deref(),
            0.0,
        )?;
        let required = inputs::parse_number(
            "coverage_required",
            inputs.coverage_required.as_deref(),
            DEFAULT_COVERAGE_REQUIRED,
        )?;

        let candidate = DeploymentContract {
            schema_version: CONTRACT_SCHEMA_VERSION.to_string(),
            meta: ContractMeta {
                adapter: inputs.adapter_or_default().to_string(),
                engine: inputs.engine,
                timestamp: contract_timestamp(self.policy.now()),
                trigger: self.context.event_name.clone(),
            },
            status: ContractStatus::Succeeded,
            quality: Quality {
                coverage: Coverage::new(actual, required),
                tests: tests.summary,
            },
            audit: Audit {
                triggered_by: self.context.actor.clone(),
                org_id: org_id.to_string(),
                repository: self.context.repository.clone(),
                commit: self.context.commit_or_unknown().to_string(),
            },
        };

        let contract = ContractValidator::validate_contract(&candidate)?;
        let persisted = contract
            .persist(self.context.workspace.join(CONTRACT_FILE_NAME))
            .await?;

        info!(
            path = %persisted.path.display(),
            digest = %persisted.digest,
            coverage_met = contract.quality.coverage.met,
            "contract written"
        );
        report.outputs.contract_path = Some(persisted.path);
        report.outputs.contract_digest = Some(persisted.digest);
        report.contract = Some(contract);
        Ok(())
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("policy", &self.policy)
            .field("installer", &self.installer.name())
            .field("identity", &self.identity.name())
            .field("context", &self.context)
            .finish()
    }
}
