use std::fmt;

use serde::Serialize;

use crate::error::GovernanceError;

/// Orchestrator phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Policy,
    Bootstrap,
    Identity,
    Contract,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::Policy,
        Phase::Bootstrap,
        Phase::Identity,
        Phase::Contract,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Policy => "policy",
            Self::Bootstrap => "bootstrap",
            Self::Identity => "identity",
            Self::Contract => "contract",
        }
    }

    /// Stable code reported when this phase fails.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Policy => ErrorCode::PolicyViolation,
            Self::Bootstrap => ErrorCode::BootstrapFailed,
            Self::Identity => ErrorCode::AuthenticationFailed,
            Self::Contract => ErrorCode::ContractGenerationFailed,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    PolicyViolation,
    BootstrapFailed,
    AuthenticationFailed,
    ContractGenerationFailed,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PolicyViolation => "POLICY_VIOLATION",
            Self::BootstrapFailed => "BOOTSTRAP_FAILED",
            Self::AuthenticationFailed => "AUTHENTICATION_FAILED",
            Self::ContractGenerationFailed => "CONTRACT_GENERATION_FAILED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure tagged with the phase it happened in.
///
/// The cause is kept intact so the full chain can be logged; `message` is the
/// cause's top-level text.
#[derive(Debug, thiserror::Error)]
#[error("[{code}] {phase} phase failed: {message}")]
pub struct PhaseError {
    pub phase: Phase,
    pub code: ErrorCode,
    pub message: String,
    #[source]
    pub cause: anyhow::Error,
}

impl PhaseError {
    pub fn new(phase: Phase, cause: impl Into<anyhow::Error>) -> Self {
        let cause = cause.into();
        Self {
            phase,
            code: phase.error_code(),
            message: cause.to_string(),
            cause,
        }
    }

    /// The governance error at the root of this failure, if any.
    pub fn governance(&self) -> Option<&GovernanceError> {
        self.cause
            .chain()
            .find_map(|e| e.downcast_ref::<GovernanceError>())
    }

    /// True when the run was intentionally blocked by a freeze window.
    pub fn is_freeze_violation(&self) -> bool {
        self.governance()
            .is_some_and(GovernanceError::is_freeze_violation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_codes_follow_phase() {
        let codes: Vec<_> = Phase::ALL.iter().map(|p| p.error_code().as_str()).collect();
        assert_eq!(
            codes,
            [
                "POLICY_VIOLATION",
                "BOOTSTRAP_FAILED",
                "AUTHENTICATION_FAILED",
                "CONTRACT_GENERATION_FAILED"
            ]
        );
    }

    #[test]
    fn test_freeze_violation_detected_through_context() {
        let cause = Err::<(), _>(GovernanceError::FreezeViolation {
            day: "Friday".into(),
            start: "09:00".into(),
            end: "17:00".into(),
        })
        .context("policy check")
        .unwrap_err();
        let err = PhaseError::new(Phase::Policy, cause);
        assert!(err.is_freeze_violation());
        assert_eq!(err.code, ErrorCode::PolicyViolation);
    }

    #[test]
    fn test_invalid_policy_is_not_freeze() {
        let err = PhaseError::new(
            Phase::Policy,
            GovernanceError::InvalidPolicy {
                message: "bad".into(),
            },
        );
        assert!(!err.is_freeze_violation());
        assert!(err.message.starts_with("Invalid Governance Policy: "));
        assert!(err.to_string().contains("POLICY_VIOLATION"));
    }

    #[test]
    fn test_plain_cause_has_no_governance_error() {
        let err = PhaseError::new(Phase::Identity, anyhow::anyhow!("jwt grant rejected"));
        assert!(err.governance().is_none());
        assert_eq!(err.code, ErrorCode::AuthenticationFailed);
        assert_eq!(err.message, "jwt grant rejected");
    }
}
