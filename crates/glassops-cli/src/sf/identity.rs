use std::io::Write;

use anyhow::{Context, Result};
use async_trait::async_trait;
use glassops_core::{AuthRequest, IdentityResolver};
use serde_json::Value;
use tempfile::NamedTempFile;

use super::exec;

/// JWT bearer login through `sf org login jwt`.
#[derive(Debug, Clone)]
pub struct SfIdentity {
    sf: String,
}

impl Default for SfIdentity {
    fn default() -> Self {
        Self {
            sf: "sf".to_string(),
        }
    }
}

impl SfIdentity {
    pub fn new(sf: impl Into<String>) -> Self {
        Self { sf: sf.into() }
    }
}

/// Key material on disk for the duration of one login. The file is created
/// owner-only and removed on drop.
fn write_key(jwt_key: &str) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("glassops-jwt-")
        .suffix(".key")
        .tempfile()
        .context("failed to create key file")?;
    file.write_all(jwt_key.as_bytes())
        .context("failed to write key file")?;
    file.flush().context("failed to write key file")?;
    Ok(file)
}

fn login_args(request: &AuthRequest, key_path: &str) -> Vec<String> {
    let mut args: Vec<String> = [
        "org",
        "login",
        "jwt",
        "--client-id",
        request.client_id.as_str(),
        "--jwt-key-file",
        key_path,
        "--username",
        request.username.as_str(),
        "--set-default",
        "--json",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    if let Some(url) = &request.instance_url {
        args.push("--instance-url".to_string());
        args.push(url.clone());
    }
    args
}

/// Pull `result.orgId` out of the login response, or its error message.
fn parse_login(stdout: &str) -> Result<String> {
    let value: Value = serde_json::from_str(stdout.trim()).context("login response is not JSON")?;
    if let Some(org_id) = value
        .pointer("/result/orgId")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
    {
        return Ok(org_id.to_string());
    }
    match value.get("message").and_then(Value::as_str) {
        Some(message) => anyhow::bail!("login failed: {}", message),
        None => anyhow::bail!("login response has no result.orgId"),
    }
}

#[async_trait]
impl IdentityResolver for SfIdentity {
    async fn authenticate(&self, request: &AuthRequest) -> Result<String> {
        let key_file = write_key(&request.jwt_key)?;
        let key_path = key_file.path().to_string_lossy().into_owned();

        let out = exec::capture(&self.sf, login_args(request, &key_path), None).await?;
        drop(key_file);

        // sf prints a JSON error body on failure too.
        parse_login(&out.stdout).with_context(|| {
            if out.success() {
                "unexpected login response".to_string()
            } else {
                format!("sf org login jwt failed: {}", out.failure_text())
            }
        })
    }

    fn name(&self) -> &'static str {
        "sf-jwt"
    }
}
