//! Bash script task.

use std::path::PathBuf;

use tracing::debug;

use ecfjob_client::{CommandInvoker, CommandOutput};
use ecfjob_config::{ScratchConfig, TaskConfig};
use ecfjob_lifecycle::{JobLifecycle, LifecycleError, LogLevel};

use crate::error::TaskError;
use crate::scratch::ScratchDir;

/// File the script text is written to inside the scratch directory.
pub const SCRIPT_FILE_NAME: &str = "temporary_script";

/// Runs a script through a shell inside a job lifecycle.
#[derive(Debug, Clone)]
pub struct BashTask {
    script: String,
    shell: PathBuf,
    scratch: ScratchConfig,
}

impl BashTask {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            shell: TaskConfig::default().shell,
            scratch: ScratchConfig::default(),
        }
    }

    pub fn from_config(
        script: impl Into<String>,
        task: &TaskConfig,
        scratch: &ScratchConfig,
    ) -> Self {
        Self::new(script)
            .with_shell(task.shell.clone())
            .with_scratch(scratch.clone())
    }

    pub fn with_shell(mut self, shell: impl Into<PathBuf>) -> Self {
        self.shell = shell.into();
        self
    }

    pub fn with_scratch(mut self, scratch: ScratchConfig) -> Self {
        self.scratch = scratch;
        self
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    pub fn shell(&self) -> &std::path::Path {
        &self.shell
    }

    /// Run the script once. The caller owns the lifecycle.
    ///
    /// The script gets the job identity in its environment. On failure the
    /// scratch directory is kept for inspection.
    pub async fn execute(&self, job: &JobLifecycle) -> Result<CommandOutput, TaskError> {
        job.log(
            &format!("Running bash task with command {}", self.script),
            LogLevel::Info,
        );

        let mut scratch = ScratchDir::from_config(&self.scratch)?;
        let script_path = scratch.path().join(SCRIPT_FILE_NAME);
        tokio::fs::write(&script_path, &self.script).await?;

        let argv = vec![
            self.shell.to_string_lossy().into_owned(),
            script_path.to_string_lossy().into_owned(),
        ];
        let output = CommandInvoker::new()
            .with_envs(job.identity().env_vars())
            .run_argv(&argv)
            .await?;

        if !output.success() {
            scratch.preserve();
            job.log(
                &format!(
                    "Bash task failed with exit code {}, scratch kept at {}",
                    output.exit_code,
                    scratch.path().display()
                ),
                LogLevel::Error,
            );
            return Err(TaskError::ScriptFailed {
                exit_code: output.exit_code,
                stderr: output.stderr_lossy().trim().to_string(),
            });
        }

        debug!("Bash task wrote {} bytes to stdout", output.stdout.len());
        Ok(output)
    }

    /// Run the script as a whole job: init, execute, then complete or abort.
    pub async fn run(&self, job: &JobLifecycle) -> Result<CommandOutput, LifecycleError> {
        job.run(|job| async move { anyhow::Ok(self.execute(job).await?) })
            .await
    }
}

#[cfg(test)]
#[path = "bash_tests.rs"]
mod tests;
