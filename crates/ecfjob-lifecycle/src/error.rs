//! Lifecycle errors and state.

use nix::sys::signal::Signal;
use thiserror::Error;

use ecfjob_client::InvokeError;
use ecfjob_config::ConfigError;

/// Errors that can occur while driving a job through its lifecycle.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Identity or configuration was invalid; nothing was sent.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The scheduler client could not be run at all.
    #[error("Scheduler client error: {0}")]
    Invoke(#[from] InvokeError),

    /// The scheduler client ran but rejected the request.
    #[error("Scheduler rejected {action} (exit code {exit_code}): {stderr}")]
    Notification {
        action: &'static str,
        exit_code: i32,
        stderr: String,
    },

    /// Invalid lifecycle state transition.
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        from: LifecycleState,
        to: LifecycleState,
    },

    /// Failed to set up signal handlers.
    #[error("Failed to set up signal handlers: {0}")]
    SignalSetup(String),

    /// The job body returned an error or panicked; the job was aborted.
    #[error("Job failed: {0:#}")]
    JobFailed(#[source] anyhow::Error),

    /// A trapped signal ended the job; the job was aborted.
    #[error("Job interrupted by {}", .signal.as_str())]
    Interrupted { signal: Signal },

    /// Sending the abort failed after the job had already failed.
    #[error("{cause}; abort notification also failed: {notification}")]
    AbortFailed {
        cause: Box<LifecycleError>,
        notification: Box<LifecycleError>,
    },
}

impl LifecycleError {
    /// Process exit status a CLI should use for this error.
    ///
    /// Interruptions map to `128 + signo`, like a shell reports a killed child.
    pub fn exit_code(&self) -> i32 {
        match self {
            LifecycleError::Interrupted { signal } => 128 + *signal as i32,
            LifecycleError::AbortFailed { cause, .. } => cause.exit_code(),
            _ => 1,
        }
    }

    /// Whether the scheduler was told about the failure with an abort.
    pub fn aborted(&self) -> bool {
        matches!(
            self,
            LifecycleError::JobFailed(_) | LifecycleError::Interrupted { .. }
        )
    }
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LifecycleState {
    /// Constructed, init not yet sent.
    Created = 0,
    /// Init accepted, job body running.
    Running = 1,
    /// Complete was sent.
    Completed = 2,
    /// Abort was sent.
    Aborted = 3,
}

impl LifecycleState {
    /// Whether a terminal notification has been claimed.
    pub fn is_terminal(self) -> bool {
        matches!(self, LifecycleState::Completed | LifecycleState::Aborted)
    }
}

impl From<u8> for LifecycleState {
    fn from(v: u8) -> Self {
        match v {
            0 => LifecycleState::Created,
            1 => LifecycleState::Running,
            2 => LifecycleState::Completed,
            _ => LifecycleState::Aborted,
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleState::Created => write!(f, "created"),
            LifecycleState::Running => write!(f, "running"),
            LifecycleState::Completed => write!(f, "completed"),
            LifecycleState::Aborted => write!(f, "aborted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_error_display() {
        let err = LifecycleError::Notification {
            action: "init",
            exit_code: 1,
            stderr: "connection refused".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("init"));
        assert!(msg.contains("exit code 1"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_lifecycle_state_display() {
        assert_eq!(LifecycleState::Created.to_string(), "created");
        assert_eq!(LifecycleState::Running.to_string(), "running");
        assert_eq!(LifecycleState::Completed.to_string(), "completed");
        assert_eq!(LifecycleState::Aborted.to_string(), "aborted");
    }

    #[test]
    fn test_state_round_trips_through_u8() {
        for state in [
            LifecycleState::Created,
            LifecycleState::Running,
            LifecycleState::Completed,
            LifecycleState::Aborted,
        ] {
            assert_eq!(LifecycleState::from(state as u8), state);
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(!LifecycleState::Created.is_terminal());
        assert!(!LifecycleState::Running.is_terminal());
        assert!(LifecycleState::Completed.is_terminal());
        assert!(LifecycleState::Aborted.is_terminal());
    }

    #[test]
    fn test_invalid_state_transition() {
        let err = LifecycleError::InvalidStateTransition {
            from: LifecycleState::Created,
            to: LifecycleState::Completed,
        };
        let msg = err.to_string();
        assert!(msg.contains("created"));
        assert!(msg.contains("completed"));
    }

    #[test]
    fn test_interrupted_exit_code() {
        let err = LifecycleError::Interrupted {
            signal: Signal::SIGTERM,
        };
        assert_eq!(err.exit_code(), 143);
        assert!(err.to_string().contains("SIGTERM"));
        assert!(err.aborted());
    }

    #[test]
    fn test_abort_failed_reports_both() {
        let err = LifecycleError::AbortFailed {
            cause: Box::new(LifecycleError::JobFailed(anyhow::anyhow!("disk full"))),
            notification: Box::new(LifecycleError::Notification {
                action: "abort",
                exit_code: 2,
                stderr: "server down".to_string(),
            }),
        };
        let msg = err.to_string();
        assert!(msg.contains("disk full"));
        assert!(msg.contains("server down"));
        assert_eq!(err.exit_code(), 1);
        assert!(!err.aborted());
    }

    #[test]
    fn test_config_error_conversion() {
        let err: LifecycleError =
            ConfigError::MissingParameters(vec!["ECF_PASS".to_string()]).into();
        assert!(err.to_string().contains("ECF_PASS"));
    }
}
