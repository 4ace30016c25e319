use crate::cli::args::ScanArgs;
use crate::exit_codes;
use crate::sf::analyzer;

pub async fn run(args: ScanArgs) -> anyhow::Result<i32> {
    let report = analyzer::scan("sf", &args.target, args.ruleset.as_deref()).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(severity) = args.fail_on {
        let blocking = report.at_least(severity).count();
        if blocking > 0 {
            eprintln!(
                "{} violation(s) at severity {} or higher",
                blocking, severity
            );
            return Ok(exit_codes::RUN_FAILED);
        }
    }
    Ok(exit_codes::SUCCESS)
}
