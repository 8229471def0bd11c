//! Bash task errors.

use std::path::PathBuf;

use thiserror::Error;

use ecfjob_client::InvokeError;

/// Errors raised while preparing or running a bash task.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The scratch directory could not be created or located.
    #[error("Scratch directory error in {path}: {source}")]
    Scratch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The script ran and exited nonzero.
    #[error("Failed to execute bash task (exit code {exit_code}): {stderr}")]
    ScriptFailed { exit_code: i32, stderr: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The interpreter could not be started.
    #[error("Failed to start interpreter: {0}")]
    Invoke(#[from] InvokeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_failed_display() {
        let err = TaskError::ScriptFailed {
            exit_code: 2,
            stderr: "no such file".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("exit code 2"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_scratch_display_names_path() {
        let err = TaskError::Scratch {
            path: PathBuf::from("/nonexistent"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.to_string().contains("/nonexistent"));
    }
}
