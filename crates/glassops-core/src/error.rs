//! Error types for the governance core.

/// Governance errors raised by the policy engine and the contract validator.
#[derive(Debug, thiserror::Error)]
pub enum GovernanceError {
    /// Config file present but not valid JSON or not a valid policy.
    #[error("Invalid Governance Policy: {message}")]
    InvalidPolicy { message: String },

    /// The current instant falls inside a configured freeze window.
    #[error("FROZEN: Deployment blocked by governance window ({day} {start}-{end})")]
    FreezeViolation {
        day: String,
        start: String,
        end: String,
    },

    /// A non-empty whitelist exists and the plugin is not on it.
    #[error("Plugin '{plugin}' is not in the whitelist. Allowed plugins: {allowed}")]
    PluginNotWhitelisted { plugin: String, allowed: String },

    /// The installer reported success but the plugin is missing from the listing.
    #[error("Plugin '{plugin}' installation verification failed")]
    PluginVerificationFailed { plugin: String },

    /// The deployment contract failed structural validation.
    #[error("contract schema violation at {path}: {reason}")]
    SchemaViolation { path: String, reason: String },
}

impl GovernanceError {
    pub(crate) fn invalid_policy(message: impl Into<String>) -> Self {
        Self::InvalidPolicy {
            message: message.into(),
        }
    }

    pub(crate) fn schema(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SchemaViolation {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True for an intentional block, as opposed to a misconfiguration.
    pub fn is_freeze_violation(&self) -> bool {
        matches!(self, Self::FreezeViolation { .. })
    }
}

/// Result type for governance operations.
pub type GovernanceResult<T> = Result<T, GovernanceError>;
