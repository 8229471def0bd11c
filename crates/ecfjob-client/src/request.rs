//! Scheduler notification requests.

use std::fmt;

use crate::error::InvokeError;

/// A single request sent through the scheduler client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientRequest {
    /// The job has started.
    Init { run_id: u32 },
    /// The job finished successfully.
    Complete,
    /// The job failed or was terminated.
    Abort { run_id: u32 },
    /// Set an event.
    Event { name: String },
    /// Update a label with free text.
    Label { name: String, message: String },
    /// Update a meter.
    Meter { name: String, value: i64 },
    /// Check that a server answers (administrative).
    Ping { host: String, port: u16 },
}

impl ClientRequest {
    /// Short action name used in logs and errors.
    pub fn action(&self) -> &'static str {
        match self {
            ClientRequest::Init { .. } => "init",
            ClientRequest::Complete => "complete",
            ClientRequest::Abort { .. } => "abort",
            ClientRequest::Event { .. } => "event",
            ClientRequest::Label { .. } => "label",
            ClientRequest::Meter { .. } => "meter",
            ClientRequest::Ping { .. } => "ping",
        }
    }

    /// Whether this request ends the job from the scheduler's point of view.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ClientRequest::Complete | ClientRequest::Abort { .. })
    }

    /// Render the client arguments, shell-quoted where needed.
    pub fn to_args(&self) -> Result<String, InvokeError> {
        let args = match self {
            ClientRequest::Init { run_id } => format!("--init={}", run_id),
            ClientRequest::Complete => "--complete".to_string(),
            ClientRequest::Abort { run_id } => format!("--abort={}", run_id),
            ClientRequest::Event { name } => format!("--event={}", quote(name)?),
            ClientRequest::Label { name, message } => {
                format!("--label={} {}", quote(name)?, quote_always(message)?)
            }
            ClientRequest::Meter { name, value } => format!("--meter={} {}", quote(name)?, value),
            ClientRequest::Ping { host, port } => {
                format!("--ping --host={} --port={}", quote(host)?, port)
            }
        };
        Ok(args)
    }
}

impl fmt::Display for ClientRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientRequest::Init { run_id } | ClientRequest::Abort { run_id } => {
                write!(f, "{}({})", self.action(), run_id)
            }
            ClientRequest::Complete => write!(f, "complete"),
            ClientRequest::Event { name } => write!(f, "event({})", name),
            ClientRequest::Label { name, .. } => write!(f, "label({})", name),
            ClientRequest::Meter { name, value } => write!(f, "meter({}={})", name, value),
            ClientRequest::Ping { host, port } => write!(f, "ping({}:{})", host, port),
        }
    }
}

fn quote(token: &str) -> Result<String, InvokeError> {
    shlex::try_quote(token)
        .map(|q| q.into_owned())
        .map_err(|e| InvokeError::InvalidQuoting(e.to_string()))
}

/// Quote even when the text is a single safe word, so empty messages survive.
fn quote_always(text: &str) -> Result<String, InvokeError> {
    let quoted = quote(text)?;
    if quoted.starts_with('\'') || quoted.starts_with('"') {
        Ok(quoted)
    } else {
        Ok(format!("'{}'", quoted))
    }
}
