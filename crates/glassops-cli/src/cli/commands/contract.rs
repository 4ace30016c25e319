use anyhow::Context;
use glassops_core::ContractValidator;

use crate::cli::args::{ContractArgs, ContractCommand};
use crate::exit_codes;

pub fn run(args: ContractArgs) -> anyhow::Result<i32> {
    match args.cmd {
        ContractCommand::Validate { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            match ContractValidator::validate_str(&content) {
                Ok(contract) => {
                    println!(
                        "{}: valid (status {}, coverage met: {})",
                        file.display(),
                        contract.status.as_str(),
                        contract.quality.coverage.met
                    );
                    Ok(exit_codes::SUCCESS)
                }
                Err(e) => {
                    eprintln!("{}: {}", file.display(), e);
                    Ok(exit_codes::RUN_FAILED)
                }
            }
        }
    }
}
