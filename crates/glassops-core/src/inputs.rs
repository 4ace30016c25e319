//! Caller-supplied run inputs and their parsing rules.

use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::contract::{Engine, TestSummary};

/// Identity endpoint used when `instance_url` is not given.
pub const DEFAULT_INSTANCE_URL: &str = "https://login.salesforce.com";

/// Required coverage when `coverage_required` is not given.
pub const DEFAULT_COVERAGE_REQUIRED: f64 = 75.0;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InputError {
    #[error("input '{name}' is required")]
    Missing { name: &'static str },

    #[error("input 'jwt_key' must be a PEM key with BEGIN and END markers")]
    MalformedKey,

    #[error("input 'instance_url' is not a valid URL: {reason}")]
    InvalidUrl { reason: String },

    #[error("input '{name}' must be a number, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
}

/// Everything a run needs from its caller beyond the run context.
#[derive(Debug, Clone, Default)]
pub struct RunInputs {
    pub client_id: String,
    pub jwt_key: String,
    pub username: String,
    pub instance_url: Option<String>,
    pub enforce_policy: bool,
    pub skip_auth: bool,
    pub plugins: Vec<String>,
    /// Raw `{total, passed, failed}` JSON, possibly empty.
    pub test_results: Option<String>,
    pub coverage_percentage: Option<String>,
    pub coverage_required: Option<String>,
    pub adapter: Option<String>,
    pub engine: Engine,
}

/// Credentials handed to the identity resolver.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthRequest {
    pub client_id: String,
    pub jwt_key: String,
    pub username: String,
    pub instance_url: Option<String>,
}

impl std::fmt::Debug for AuthRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthRequest")
            .field("client_id", &self.client_id)
            .field("jwt_key", &"<redacted>")
            .field("username", &self.username)
            .field("instance_url", &self.instance_url)
            .finish()
    }
}

impl AuthRequest {
    /// Check credentials before any external call is made.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.client_id.trim().is_empty() {
            return Err(InputError::Missing { name: "client_id" });
        }
        if self.username.trim().is_empty() {
            return Err(InputError::Missing { name: "username" });
        }
        if !(self.jwt_key.contains("BEGIN") && self.jwt_key.contains("END")) {
            return Err(InputError::MalformedKey);
        }
        if let Some(raw) = &self.instance_url {
            let url = Url::parse(raw).map_err(|e| InputError::InvalidUrl {
                reason: e.to_string(),
            })?;
            if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
                return Err(InputError::InvalidUrl {
                    reason: format!("'{}' is not an http(s) URL", raw),
                });
            }
        }
        Ok(())
    }
}

impl RunInputs {
    pub fn auth_request(&self) -> AuthRequest {
        AuthRequest {
            client_id: self.client_id.clone(),
            jwt_key: self.jwt_key.clone(),
            username: self.username.clone(),
            instance_url: Some(
                self.instance_url
                    .as_deref()
                    .filter(|u| !u.trim().is_empty())
                    .unwrap_or(DEFAULT_INSTANCE_URL)
                    .to_string(),
            ),
        }
    }

    pub fn adapter_or_default(&self) -> &str {
        self.adapter
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or("native")
    }
}

/// Split a comma-separated plugin list, dropping blanks.
pub fn parse_plugin_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

/// `"true"` (any case) is true; everything else is false.
pub fn parse_flag(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("true")
}

#[derive(Deserialize)]
struct RawTestResults {
    total: u64,
    passed: u64,
    failed: u64,
}

/// Outcome of parsing the `test_results` input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTestResults {
    pub summary: TestSummary,
    /// Set when the payload was present but unusable.
    pub warning: Option<String>,
}

/// Parse `{total, passed, failed}`; a malformed payload degrades to zero
/// counts with a warning instead of failing.
pub fn parse_test_results(raw: Option<&str>) -> ParsedTestResults {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return ParsedTestResults {
            summary: TestSummary::default(),
            warning: None,
        };
    };

    match serde_json::from_str::<RawTestResults>(raw) {
        Ok(parsed) => ParsedTestResults {
            summary: TestSummary {
                total: parsed.total,
                passed: parsed.passed,
                failed: parsed.failed,
            },
            warning: None,
        },
        Err(e) => {
            let message = format!("Failed to parse test_results ({}); using zero counts", e);
            warn!(error = %e, "malformed test_results input");
            ParsedTestResults {
                summary: TestSummary::default(),
                warning: Some(message),
            }
        }
    }
}

/// Parse an optional numeric input, using `default` when blank.
pub fn parse_number(
    name: &'static str,
    raw: Option<&str>,
    default: f64,
) -> Result<f64, InputError> {
    match raw.map(str::trim).filter(|r| !r.is_empty()) {
        None => Ok(default),
        Some(value) => value
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| InputError::InvalidNumber {
                name,
                value: value.to_string(),
            }),
    }
}
