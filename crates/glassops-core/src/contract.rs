//! Deployment contract: the audit record emitted at the end of a run.
//!
//! Contracts are assembled as JSON, checked by [`ContractValidator`], and only
//! then written to `glassops-contract.json`. A contract that fails validation
//! is never written.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{DateTime, SecondsFormat, Utc};
use jsonschema::error::ValidationErrorKind;
use jsonschema::Draft;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{GovernanceError, GovernanceResult};

/// Contract file name, resolved against the workspace root.
pub const CONTRACT_FILE_NAME: &str = "glassops-contract.json";

/// Schema version filled in when a candidate omits it.
pub const CONTRACT_SCHEMA_VERSION: &str = "1.0";

/// Deployment engine that produced the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    #[default]
    Native,
    Hardis,
    Custom,
}

impl Engine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Hardis => "hardis",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractStatus {
    Succeeded,
    Failed,
    Blocked,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::Blocked => "Blocked",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractMeta {
    pub adapter: String,
    pub engine: Engine,
    /// ISO-8601 UTC timestamp.
    pub timestamp: String,
    pub trigger: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coverage {
    pub actual: f64,
    pub required: f64,
    pub met: bool,
}

impl Coverage {
    /// Coverage figures with `met` derived as `actual >= required`.
    pub fn new(actual: f64, required: f64) -> Self {
        Self {
            actual,
            required,
            met: actual >= required,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TestSummary {
    #[serde(deserialize_with = "whole_count")]
    pub total: u64,
    #[serde(deserialize_with = "whole_count")]
    pub passed: u64,
    #[serde(deserialize_with = "whole_count")]
    pub failed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quality {
    pub coverage: Coverage,
    pub tests: TestSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Audit {
    pub triggered_by: String,
    pub org_id: String,
    pub repository: String,
    pub commit: String,
}

/// A validated deployment contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentContract {
    pub schema_version: String,
    pub meta: ContractMeta,
    pub status: ContractStatus,
    pub quality: Quality,
    pub audit: Audit,
}

/// Timestamp in the form contracts carry: UTC, millisecond precision, `Z`.
pub fn contract_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A contract written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedContract {
    pub path: PathBuf,
    /// `sha256:<hex>` of the written bytes.
    pub digest: String,
}

impl DeploymentContract {
    /// Pretty-printed JSON form.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write the contract and return its path and content digest.
    pub async fn persist(&self, path: impl AsRef<Path>) -> std::io::Result<PersistedContract> {
        let path = path.as_ref();
        let content = self.to_json_pretty()?;
        tokio::fs::write(path, content.as_bytes()).await?;

        Ok(PersistedContract {
            path: path.to_path_buf(),
            digest: format!("sha256:{}", hex::encode(Sha256::digest(content.as_bytes()))),
        })
    }
}

/// Embedded JSON Schema for deployment contracts.
const CONTRACT_SCHEMA_JSON: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../schemas/glassops-contract.schema.json"
));

static CONTRACT_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

fn compiled_schema() -> GovernanceResult<&'static jsonschema::Validator> {
    CONTRACT_SCHEMA
        .get_or_init(|| {
            let schema: Value = serde_json::from_str(CONTRACT_SCHEMA_JSON)
                .map_err(|e| format!("failed to parse embedded contract schema: {e}"))?;
            jsonschema::options()
                .with_draft(Draft::Draft202012)
                .should_validate_formats(true)
                .build(&schema)
                .map_err(|e| format!("failed to compile contract schema: {e}"))
        })
        .as_ref()
        .map_err(|e| GovernanceError::schema("$", e.clone()))
}

/// Dotted field path for a schema error, e.g. `quality.coverage.actual`.
///
/// Missing required fields point at the field itself rather than its parent.
fn error_path(error: &jsonschema::ValidationError<'_>) -> String {
    let mut segments: Vec<String> = error
        .instance_path()
        .to_string()
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| s.replace("~1", "/").replace("~0", "~"))
        .collect();
    if let ValidationErrorKind::Required { property } = error.kind() {
        segments.push(property.as_str().map_or_else(|| property.to_string(), str::to_string));
    }
    if segments.is_empty() {
        "$".to_string()
    } else {
        segments.join(".")
    }
}

/// Structural validation for contract candidates.
///
/// Candidates are checked against the embedded contract schema: required
/// fields and types, the engine and status enumerations, coverage
/// percentages in `[0, 100]`, non-negative integer test counts, and an
/// RFC 3339 UTC timestamp. The first violation is reported with its field
/// path.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContractValidator;

impl ContractValidator {
    pub fn validate(candidate: &Value) -> GovernanceResult<DeploymentContract> {
        let mut candidate = candidate.clone();
        if let Some(root) = candidate.as_object_mut() {
            root.entry("schemaVersion")
                .or_insert_with(|| Value::String(CONTRACT_SCHEMA_VERSION.to_string()));
        }

        compiled_schema()?
            .validate(&candidate)
            .map_err(|e| GovernanceError::schema(error_path(&e), e.to_string()))?;

        serde_json::from_value(candidate).map_err(|e| GovernanceError::schema("$", e.to_string()))
    }

    /// Validate an already-typed contract by round-tripping through JSON.
    pub fn validate_contract(
        contract: &DeploymentContract,
    ) -> GovernanceResult<DeploymentContract> {
        let value = serde_json::to_value(contract)
            .map_err(|e| GovernanceError::schema("$", e.to_string()))?;
        Self::validate(&value)
    }

    /// Parse and validate contract JSON text.
    pub fn validate_str(content: &str) -> GovernanceResult<DeploymentContract> {
        let value: Value =
            serde_json::from_str(content).map_err(|e| GovernanceError::schema("$", e.to_string()))?;
        Self::validate(&value)
    }
}

/// Test counts arrive as JSON integers or as whole floats such as `5.0`.
fn whole_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = serde_json::Number::deserialize(deserializer)?;
    number
        .as_u64()
        .or_else(|| {
            number
                .as_f64()
                .filter(|v| v.fract() == 0.0 && *v >= 0.0 && *v < u64::MAX as f64)
                .map(|v| v as u64)
        })
        .ok_or_else(|| D::Error::custom(format!("expected a whole count, got {number}")))
}
