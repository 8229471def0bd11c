//! Job identity: the `ECF_*` variables that tie a process to a scheduler task.

use std::collections::HashMap;
use std::fmt;

use crate::error::ConfigError;

pub const ECF_NAME: &str = "ECF_NAME";
pub const ECF_PASS: &str = "ECF_PASS";
pub const ECF_NODE: &str = "ECF_NODE";
pub const ECF_PORT: &str = "ECF_PORT";
pub const ECF_TRYNO: &str = "ECF_TRYNO";
pub const ECF_RID: &str = "ECF_RID";

/// Optional parameter naming the job's logger.
pub const LOGGER_KEY: &str = "logger";

/// Parameters every job must be constructed with.
pub const MANDATORY_VARS: [&str; 5] = [ECF_NAME, ECF_PASS, ECF_NODE, ECF_PORT, ECF_TRYNO];

/// Identity of one job execution as seen by the scheduler.
///
/// All mandatory fields are validated at construction; the run id is always
/// the id of the current process.
#[derive(Clone, PartialEq, Eq)]
pub struct JobIdentity {
    name: String,
    pass: String,
    node: String,
    port: u16,
    try_no: u32,
    run_id: u32,
    logger: Option<String>,
}

impl JobIdentity {
    /// Create an identity from already typed values.
    pub fn new(
        name: impl Into<String>,
        pass: impl Into<String>,
        node: impl Into<String>,
        port: u16,
        try_no: u32,
    ) -> Self {
        Self {
            name: name.into(),
            pass: pass.into(),
            node: node.into(),
            port,
            try_no,
            run_id: std::process::id(),
            logger: None,
        }
    }

    /// Build an identity from a parameter map.
    ///
    /// Keys other than the mandatory ones are ignored, except [`LOGGER_KEY`].
    /// Every missing key is reported in a single [`ConfigError::MissingParameters`].
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| params.get(key).cloned())
    }

    /// Build an identity from the current process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let missing: Vec<String> = MANDATORY_VARS
            .iter()
            .filter(|key| lookup(key).is_none())
            .map(|key| key.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingParameters(missing));
        }

        let get = |key: &str| lookup(key).unwrap_or_default();
        let port = parse_field::<u16>(ECF_PORT, &get(ECF_PORT))?;
        let try_no = parse_field::<u32>(ECF_TRYNO, &get(ECF_TRYNO))?;

        let mut identity = Self::new(get(ECF_NAME), get(ECF_PASS), get(ECF_NODE), port, try_no);
        identity.logger = lookup(LOGGER_KEY);
        Ok(identity)
    }

    /// Set the logger name.
    pub fn with_logger(mut self, logger: impl Into<String>) -> Self {
        self.logger = Some(logger.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pass(&self) -> &str {
        &self.pass
    }

    pub fn node(&self) -> &str {
        &self.node
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn try_no(&self) -> u32 {
        self.try_no
    }

    /// Run id sent with `init` and `abort`: the current process id.
    pub fn run_id(&self) -> u32 {
        self.run_id
    }

    /// Logger name, falling back to the task name.
    pub fn logger_name(&self) -> &str {
        self.logger.as_deref().unwrap_or(&self.name)
    }

    /// Environment handed to every child the job spawns.
    pub fn env_vars(&self) -> Vec<(&'static str, String)> {
        vec![
            (ECF_NAME, self.name.clone()),
            (ECF_PASS, self.pass.clone()),
            (ECF_NODE, self.node.clone()),
            (ECF_PORT, self.port.to_string()),
            (ECF_TRYNO, self.try_no.to_string()),
            (ECF_RID, self.run_id.to_string()),
        ]
    }

    /// Export the identity into this process's environment.
    ///
    /// # Safety
    ///
    /// Mutating the environment is only sound while no other thread reads or
    /// writes it. Call this before starting the async runtime or any thread.
    pub unsafe fn export_to_process_env(&self) {
        for (key, value) in self.env_vars() {
            // SAFETY: upheld by the caller.
            unsafe { std::env::set_var(key, value) };
        }
    }
}

impl fmt::Debug for JobIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobIdentity")
            .field("name", &self.name)
            .field("pass", &"<redacted>")
            .field("node", &self.node)
            .field("port", &self.port)
            .field("try_no", &self.try_no)
            .field("run_id", &self.run_id)
            .field("logger", &self.logger)
            .finish()
    }
}

fn parse_field<T>(field: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
        field: field.to_string(),
        message: format!("'{}': {}", raw, e),
    })
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
