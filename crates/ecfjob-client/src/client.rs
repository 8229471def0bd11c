//! Scheduler client seam and its `ecflow_client` implementation.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use ecfjob_config::{ClientConfig, JobIdentity};

use crate::error::InvokeError;
use crate::invoker::{CommandInvoker, CommandOutput};
use crate::request::ClientRequest;

/// Transport for scheduler notifications.
///
/// Implementations report what the client did; deciding whether a nonzero
/// exit code is fatal is left to the caller.
#[async_trait]
pub trait SchedulerClient: Send + Sync {
    /// Send one request and wait for the client to exit.
    async fn send(&self, request: &ClientRequest) -> Result<CommandOutput, InvokeError>;
}

/// Scheduler client that shells out to `ecflow_client`.
#[derive(Debug, Clone)]
pub struct EcflowClient {
    program: String,
    invoker: CommandInvoker,
}

impl EcflowClient {
    /// Create a client for the given program with no timeout.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            invoker: CommandInvoker::new(),
        }
    }

    /// Create a client from configuration.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.program.clone()).with_timeout(config.timeout())
    }

    /// Pass the job identity to every client invocation.
    pub fn with_identity(mut self, identity: &JobIdentity) -> Self {
        self.invoker = self.invoker.with_envs(identity.env_vars());
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.invoker = self.invoker.with_timeout(timeout);
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Full command line for a request.
    pub fn command_line(&self, request: &ClientRequest) -> Result<String, InvokeError> {
        let program = shlex::try_quote(&self.program)
            .map_err(|e| InvokeError::InvalidQuoting(e.to_string()))?;
        Ok(format!("{} {}", program, request.to_args()?))
    }
}

impl Default for EcflowClient {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

#[async_trait]
impl SchedulerClient for EcflowClient {
    async fn send(&self, request: &ClientRequest) -> Result<CommandOutput, InvokeError> {
        let line = self.command_line(request)?;
        debug!("Sending {} via {}", request, self.program);
        self.invoker.run(&line).await
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
