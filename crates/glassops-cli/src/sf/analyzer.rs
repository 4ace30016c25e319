use anyhow::{Context, Result};
use glassops_core::AnalyzerReport;
use tracing::info;

use super::exec;

/// Arguments for `sf code-analyzer run`.
pub fn scan_args(targets: &[String], ruleset: Option<&str>) -> Vec<String> {
    let mut args: Vec<String> = [
        "code-analyzer",
        "run",
        "--normalize-severity",
        "--output-format",
        "json",
        "--target",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    args.push(targets.join(","));
    if let Some(ruleset) = ruleset {
        args.push("--ruleset".to_string());
        args.push(ruleset.to_string());
    }
    args
}

/// Run the analyzer. A non-zero exit means violations were found, not failure.
pub async fn scan(sf: &str, targets: &[String], ruleset: Option<&str>) -> Result<AnalyzerReport> {
    let out = exec::capture(sf, scan_args(targets, ruleset), None)
        .await
        .context("analyzer execution failed")?;
    let exit_code = out.status.unwrap_or(-1);
    let report = AnalyzerReport::parse(&out.stdout, exit_code);
    info!(
        violations = report.violations.len(),
        exit_code, "analyzer finished"
    );
    Ok(report)
}
