//! GlassOps governance core.
//!
//! Decides whether a deployment may proceed and records the outcome:
//!
//! - [`PolicyEngine`] loads `devops-config.json`, enforces freeze windows and
//!   resolves the plugin whitelist.
//! - [`Orchestrator`] runs the Policy, Bootstrap, Identity and Contract phases
//!   against a [`RuntimeInstaller`] and an [`IdentityResolver`].
//! - [`ContractValidator`] checks the deployment contract before it is written.

pub mod analyzer;
pub mod config;
pub mod context;
pub mod contract;
pub mod error;
pub mod freeze;
pub mod inputs;
pub mod orchestrator;
pub mod plugin;
pub mod policy;
pub mod runtime;

pub use analyzer::{AnalyzerReport, Violation};
pub use config::{ConfigSource, ConfigStore, FreezeWindow, ProtocolConfig, TimeOfDay, Weekday};
pub use context::{ContextError, RunContext};
pub use contract::{ContractStatus, ContractValidator, DeploymentContract, Engine};
pub use error::{GovernanceError, GovernanceResult};
pub use freeze::{Clock, FixedClock, SystemClock};
pub use inputs::{AuthRequest, InputError, RunInputs};
pub use orchestrator::{
    ErrorCode, Orchestrator, Phase, PhaseError, RunOutputs, RunReport, SKIP_AUTH_ORG_ID,
};
pub use plugin::PluginRef;
pub use policy::PolicyEngine;
pub use runtime::{IdentityResolver, InstalledPlugin, RuntimeInstaller};
