//! `ecfjob run`: a bash task under scheduler lifecycle control.

use std::io::Write;
use std::process::ExitCode;

use anyhow::Context;
use tracing::{error, info};

use ecfjob_client::CommandOutput;
use ecfjob_config::{Config, JobIdentity};
use ecfjob_lifecycle::{JobLifecycle, LifecycleError};
use ecfjob_task_bash::BashTask;

use crate::cli::RunArgs;
use crate::Settings;

/// Handle the run subcommand.
///
/// Identity is validated and exported before tracing or the runtime start
/// any thread.
pub(crate) fn handle_run(args: RunArgs, settings: Settings) -> ExitCode {
    let identity = match args.identity.resolve() {
        Ok(identity) => identity,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // SAFETY: the process is still single-threaded here.
    unsafe { identity.export_to_process_env() };

    if let Err(e) = crate::init_tracing(&settings.config.logging, &settings.warnings) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let task = match build_task(&args, &settings.config) {
        Ok(task) => task,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run_job(identity, task, &settings.config)) {
        Ok(output) => {
            let _ = std::io::stdout().write_all(&output.stdout);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            crate::exit_code(e.exit_code())
        }
    }
}

fn build_task(args: &RunArgs, config: &Config) -> anyhow::Result<BashTask> {
    let script = match (&args.command, &args.script) {
        (Some(command), _) => command.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?,
        (None, None) => anyhow::bail!("Either --command or --script is required"),
    };

    let mut scratch = config.scratch.clone();
    scratch.preserve |= args.preserve;

    let mut task = BashTask::from_config(script, &config.task, &scratch);
    if let Some(shell) = &args.shell {
        task = task.with_shell(shell.clone());
    }
    Ok(task)
}

async fn run_job(
    identity: JobIdentity,
    task: BashTask,
    config: &Config,
) -> Result<CommandOutput, LifecycleError> {
    let job = JobLifecycle::from_config(identity, &config.client);
    info!(
        "Running {} (run id {}, try {})",
        job.identity().name(),
        job.run_id(),
        job.identity().try_no()
    );
    task.run(&job).await
}
