use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use glassops_core::inputs::{parse_flag, parse_plugin_list};
use glassops_core::{Engine, RunInputs};

#[derive(Parser)]
#[command(
    name = "glassops",
    version,
    about = "Governance runtime for CI deployments: freeze windows, plugin whitelist, deployment contract"
)]
pub struct Cli {
    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text, env = "GLASSOPS_LOG_FORMAT")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run every governance phase and write the deployment contract
    Run(RunArgs),
    /// Evaluate the governance policy without side effects
    Check(CheckArgs),
    /// Deployment contract utilities
    Contract(ContractArgs),
    /// Run the code analyzer and print its violations
    Scan(ScanArgs),
    Version,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EngineArg {
    #[default]
    Native,
    Hardis,
    Custom,
}

impl From<EngineArg> for Engine {
    fn from(arg: EngineArg) -> Self {
        match arg {
            EngineArg::Native => Engine::Native,
            EngineArg::Hardis => Engine::Hardis,
            EngineArg::Custom => Engine::Custom,
        }
    }
}

/// Run inputs. Each one also reads the `INPUT_<NAME>` variable GitHub Actions
/// sets for action inputs.
#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    #[arg(long, env = "INPUT_CLIENT_ID", default_value = "")]
    pub client_id: String,

    /// PEM private key used for the JWT grant
    #[arg(long, env = "INPUT_JWT_KEY", default_value = "", hide_env_values = true)]
    pub jwt_key: String,

    #[arg(long, env = "INPUT_USERNAME", default_value = "")]
    pub username: String,

    /// Identity endpoint [default: https://login.salesforce.com]
    #[arg(long, env = "INPUT_INSTANCE_URL")]
    pub instance_url: Option<String>,

    /// Enforce freeze windows ("true"/"false")
    #[arg(long, env = "INPUT_ENFORCE_POLICY", default_value = "true")]
    pub enforce_policy: String,

    /// Skip authentication and record a placeholder org id (dry runs only)
    #[arg(long, env = "INPUT_SKIP_AUTH", default_value = "false")]
    pub skip_auth: String,

    /// Comma-separated plugins to install
    #[arg(long, env = "INPUT_PLUGINS", default_value = "")]
    pub plugins: String,

    /// Test results as JSON: {"total":N,"passed":N,"failed":N}
    #[arg(long, env = "INPUT_TEST_RESULTS")]
    pub test_results: Option<String>,

    #[arg(long, env = "INPUT_COVERAGE_PERCENTAGE")]
    pub coverage_percentage: Option<String>,

    #[arg(long, env = "INPUT_COVERAGE_REQUIRED")]
    pub coverage_required: Option<String>,

    #[arg(long, env = "INPUT_ADAPTER")]
    pub adapter: Option<String>,

    #[arg(long, env = "INPUT_ENGINE", value_enum, default_value_t = EngineArg::Native)]
    pub engine: EngineArg,

    /// Abort the whole run after this many seconds
    #[arg(long, env = "GLASSOPS_TIMEOUT_SECS", default_value_t = 1800)]
    pub timeout_secs: u64,

    /// File receiving key=value outputs; stdout when unset
    #[arg(long, env = "GITHUB_OUTPUT")]
    pub output_file: Option<PathBuf>,
}

impl RunArgs {
    pub fn to_inputs(&self) -> RunInputs {
        RunInputs {
            client_id: self.client_id.clone(),
            jwt_key: self.jwt_key.clone(),
            username: self.username.clone(),
            instance_url: self.instance_url.clone(),
            enforce_policy: parse_flag(&self.enforce_policy),
            skip_auth: parse_flag(&self.skip_auth),
            plugins: parse_plugin_list(&self.plugins),
            test_results: self.test_results.clone(),
            coverage_percentage: self.coverage_percentage.clone(),
            coverage_required: self.coverage_required.clone(),
            adapter: self.adapter.clone(),
            engine: self.engine.into(),
        }
    }
}

#[derive(Args, Clone, Debug)]
pub struct CheckArgs {
    /// Workspace containing devops-config.json
    #[arg(long, env = "GITHUB_WORKSPACE", default_value = ".")]
    pub workspace: PathBuf,

    /// Plugin to check against the whitelist (repeatable)
    #[arg(long = "plugin")]
    pub plugins: Vec<String>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone, Debug)]
pub struct ContractArgs {
    #[command(subcommand)]
    pub cmd: ContractCommand,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ContractCommand {
    /// Validate a contract file against the contract schema
    Validate {
        #[arg(default_value = "glassops-contract.json")]
        file: PathBuf,
    },
}

#[derive(Args, Clone, Debug)]
pub struct ScanArgs {
    /// Directories or files to scan
    #[arg(long, value_delimiter = ',', default_value = "force-app")]
    pub target: Vec<String>,

    #[arg(long)]
    pub ruleset: Option<String>,

    /// Fail when a violation at or above this severity is found (1 = high)
    #[arg(long)]
    pub fail_on: Option<u8>,
}
