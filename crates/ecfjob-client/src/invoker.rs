//! External command execution.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::error::InvokeError;

/// Captured result of one command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Process exit code; `128 + signo` when the child was killed by a signal.
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Runs command lines as child processes and waits for them.
///
/// No retries are performed and a nonzero exit code is returned as data.
#[derive(Debug, Clone, Default)]
pub struct CommandInvoker {
    timeout: Option<Duration>,
    envs: Vec<(String, String)>,
    current_dir: Option<PathBuf>,
}

impl CommandInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound every invocation; the child is killed when the bound is hit.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add several environment variables passed to every child.
    pub fn with_envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.envs
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Run children in the given directory.
    pub fn with_current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Split a command line into argv tokens using POSIX shell quoting.
    pub fn split(command_line: &str) -> Result<Vec<String>, InvokeError> {
        let argv = shlex::split(command_line)
            .ok_or_else(|| InvokeError::InvalidQuoting(command_line.to_string()))?;
        if argv.is_empty() {
            return Err(InvokeError::EmptyCommand);
        }
        Ok(argv)
    }

    /// Split and run a command line.
    pub async fn run(&self, command_line: &str) -> Result<CommandOutput, InvokeError> {
        let argv = Self::split(command_line)?;
        self.run_argv(&argv).await
    }

    /// Run an already tokenized command.
    pub async fn run_argv(&self, argv: &[String]) -> Result<CommandOutput, InvokeError> {
        let (program, args) = argv.split_first().ok_or(InvokeError::EmptyCommand)?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }

        debug!("Invoking: {}", argv.join(" "));

        let child = cmd.spawn().map_err(|source| InvokeError::Spawn {
            program: program.clone(),
            source,
        })?;

        let output = match self.timeout {
            Some(duration) => timeout(duration, child.wait_with_output())
                .await
                .map_err(|_| InvokeError::Timeout {
                    command: argv.join(" "),
                    secs: duration.as_secs(),
                })??,
            None => child.wait_with_output().await?,
        };

        let exit_code = exit_code(&output.status);
        debug!("'{}' exited with {}", program, exit_code);

        Ok(CommandOutput {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code,
        })
    }
}

#[cfg(unix)]
fn exit_code(status: &ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    status
        .code()
        .or_else(|| status.signal().map(|signo| 128 + signo))
        .unwrap_or(-1)
}

#[cfg(not(unix))]
fn exit_code(status: &ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

#[cfg(test)]
#[path = "invoker_tests.rs"]
mod tests;
