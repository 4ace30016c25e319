use std::sync::Arc;
use std::time::Duration;

use glassops_core::{
    GovernanceError, Orchestrator, Phase, PolicyEngine, RunContext, RunOutputs, RunReport,
};
use tracing::{error, info};

use crate::cli::args::RunArgs;
use crate::exit_codes;
use crate::outputs;
use crate::sf::{SfIdentity, SfInstaller};

pub async fn run(args: RunArgs) -> anyhow::Result<i32> {
    // Published on early exits so callers always see a runtime id.
    let pending = RunOutputs::pending();

    let context = match RunContext::from_env() {
        Ok(context) => context,
        Err(e) => {
            eprintln!("::error::{}", e);
            outputs::publish(&pending, args.output_file.as_deref())?;
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };

    let orchestrator = Orchestrator::new(
        PolicyEngine::for_workspace(&context.workspace),
        Arc::new(SfInstaller::default()),
        Arc::new(SfIdentity::default()),
        context,
    );
    let inputs = args.to_inputs();

    let timeout = Duration::from_secs(args.timeout_secs);
    let run = orchestrator.run_with_id(pending.runtime_id.clone(), &inputs);
    let report = match tokio::time::timeout(timeout, run).await {
        Ok(report) => report,
        Err(_) => {
            error!(timeout_secs = args.timeout_secs, "run exceeded its time limit");
            eprintln!(
                "::error::GlassOps run timed out after {}s",
                args.timeout_secs
            );
            outputs::publish(&pending, args.output_file.as_deref())?;
            return Ok(exit_codes::TIMEOUT);
        }
    };

    outputs::publish(&report.outputs, args.output_file.as_deref())?;

    for warning in &report.warnings {
        eprintln!("::warning::{}", warning);
    }
    if let Some(message) = report.failure_message() {
        eprintln!("::error::{}", message);
    } else {
        info!(
            runtime_id = %report.outputs.runtime_id,
            "deployment is governed and ready"
        );
    }

    Ok(exit_code(&report))
}

fn exit_code(report: &RunReport) -> i32 {
    let Some(err) = &report.error else {
        return exit_codes::SUCCESS;
    };
    if err.is_freeze_violation() {
        return exit_codes::FROZEN;
    }
    match (err.phase, err.governance()) {
        (Phase::Policy, Some(GovernanceError::InvalidPolicy { .. })) => exit_codes::CONFIG_ERROR,
        _ => exit_codes::RUN_FAILED,
    }
}
