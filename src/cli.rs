//! CLI definitions for ecfjob.

use std::collections::HashMap;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use ecfjob_config::{
    ConfigError, JobIdentity, ECF_NAME, ECF_NODE, ECF_PASS, ECF_PORT, ECF_TRYNO, LOGGER_KEY,
};

/// ecfjob CLI.
#[derive(Parser)]
#[command(name = "ecfjob")]
#[command(about = "Run batch jobs under ecFlow scheduler lifecycle control")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (default: ~/.ecfjob/config.toml)
    #[arg(long, global = true, env = "ECFJOB_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run a bash script as a scheduler job
    Run(RunArgs),

    /// Administer an ecFlow server
    Admin(AdminArgs),
}

#[derive(Args)]
pub(crate) struct RunArgs {
    /// Script text to run
    #[arg(short = 'c', long, conflicts_with = "script", required_unless_present = "script")]
    pub command: Option<String>,

    /// Script file to run
    #[arg(short, long)]
    pub script: Option<PathBuf>,

    /// Keep the scratch directory and reuse it on the next run
    #[arg(long)]
    pub preserve: bool,

    /// Interpreter for the script (overrides config)
    #[arg(long)]
    pub shell: Option<PathBuf>,

    #[command(flatten)]
    pub identity: IdentityArgs,
}

/// Job identity flags, each falling back to its `ECF_*` variable.
#[derive(Args)]
pub(crate) struct IdentityArgs {
    /// Task name
    #[arg(long, env = "ECF_NAME")]
    pub name: Option<String>,

    /// Job password
    #[arg(long, env = "ECF_PASS", hide_env_values = true)]
    pub pass: Option<String>,

    /// Scheduler host
    #[arg(long, env = "ECF_NODE")]
    pub node: Option<String>,

    /// Scheduler port
    #[arg(long, env = "ECF_PORT")]
    pub port: Option<String>,

    /// Try number
    #[arg(long, env = "ECF_TRYNO")]
    pub tryno: Option<String>,

    /// Logger name (default: task name)
    #[arg(long)]
    pub logger: Option<String>,
}

impl IdentityArgs {
    /// Validate the flags into a job identity.
    ///
    /// Every missing parameter is reported at once.
    pub fn resolve(&self) -> Result<JobIdentity, ConfigError> {
        let params: HashMap<String, String> = [
            (ECF_NAME, &self.name),
            (ECF_PASS, &self.pass),
            (ECF_NODE, &self.node),
            (ECF_PORT, &self.port),
            (ECF_TRYNO, &self.tryno),
            (LOGGER_KEY, &self.logger),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_ref().map(|v| (key.to_string(), v.clone())))
        .collect();

        JobIdentity::from_params(&params)
    }
}

#[derive(Args)]
pub(crate) struct AdminArgs {
    /// Task to perform
    #[arg(value_enum)]
    pub action: AdminAction,

    /// Server host
    #[arg(short = 'H', long, default_value = "localhost")]
    pub host: String,

    /// Server port
    #[arg(short, long, default_value_t = 3141)]
    pub port: u16,

    /// Home directory to run the server (default: ~/.ecflow_server)
    #[arg(short = 'd', long)]
    pub home: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum AdminAction {
    Start,
    Stop,
    Status,
}
