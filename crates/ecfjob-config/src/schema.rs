//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub scratch: ScratchConfig,

    #[serde(default)]
    pub task: TaskConfig,
}

/// Scheduler client invocation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Client program, resolved through `PATH` when not absolute.
    #[serde(default = "default_program")]
    pub program: String,

    /// Upper bound for a single client invocation. `0` disables the bound.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Whether signals are trapped and turned into abort notifications.
    #[serde(default = "default_trap_signals")]
    pub trap_signals: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            timeout_secs: default_timeout_secs(),
            trap_signals: default_trap_signals(),
        }
    }
}

impl ClientConfig {
    /// Invocation timeout, or `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

fn default_program() -> String {
    "ecflow_client".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_trap_signals() -> bool {
    true
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,

    /// Optional directory for a daily rolling log file.
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Emit ANSI colors on the console.
    #[serde(default)]
    pub ansi: bool,

    /// Write the log file as JSON lines instead of text.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            dir: None,
            ansi: false,
            json: false,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

/// Scratch directory configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScratchConfig {
    /// Directory scratch directories are created in.
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Name prefix appended after `ecflow-`.
    #[serde(default)]
    pub prefix: String,

    /// Keep the directory after the job and reuse it on the next run.
    #[serde(default)]
    pub preserve: bool,
}

impl Default for ScratchConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            prefix: String::new(),
            preserve: false,
        }
    }
}

fn default_base_dir() -> PathBuf {
    std::env::temp_dir()
}

/// Bash task configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Interpreter used to run task scripts.
    #[serde(default = "default_shell")]
    pub shell: PathBuf,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            shell: default_shell(),
        }
    }
}

fn default_shell() -> PathBuf {
    PathBuf::from("/bin/bash")
}

/// Default configuration file location: `~/.ecfjob/config.toml`.
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".ecfjob").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from(".ecfjob/config.toml"))
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
