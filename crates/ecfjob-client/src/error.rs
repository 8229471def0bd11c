//! Command invocation errors.

use thiserror::Error;

/// Errors raised before or while running an external command.
///
/// A command that runs and exits nonzero is not an error at this level; see
/// [`crate::CommandOutput::success`].
#[derive(Debug, Error)]
pub enum InvokeError {
    /// The command line contained no tokens.
    #[error("Empty command line")]
    EmptyCommand,

    /// The command line could not be split or an argument could not be quoted.
    #[error("Invalid shell quoting: {0}")]
    InvalidQuoting(String),

    /// The executable could not be found or launched.
    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The command did not finish within the configured bound.
    #[error("Command '{command}' timed out after {secs}s")]
    Timeout { command: String, secs: u64 },

    /// Waiting on or collecting output from the child failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl InvokeError {
    /// Whether the executable never started.
    pub fn is_spawn(&self) -> bool {
        matches!(self, InvokeError::Spawn { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_error_display() {
        let err = InvokeError::Spawn {
            program: "ecflow_client".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "No such file"),
        };
        let msg = err.to_string();
        assert!(msg.contains("ecflow_client"));
        assert!(msg.contains("No such file"));
        assert!(err.is_spawn());
    }

    #[test]
    fn test_timeout_display() {
        let err = InvokeError::Timeout {
            command: "ecflow_client --complete".to_string(),
            secs: 60,
        };
        assert!(err.to_string().contains("60s"));
        assert!(!err.is_spawn());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: InvokeError = io_err.into();
        assert!(err.to_string().contains("pipe closed"));
    }
}
