//! Configuration validation.

use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_client(config, &mut result);
        Self::validate_scratch(config, &mut result);
        Self::validate_task(config, &mut result);

        result
    }

    fn validate_client(config: &Config, result: &mut ValidationResult) {
        if config.client.program.trim().is_empty() {
            result.add_error(ValidationError::new(
                "client.program",
                "Client program cannot be empty",
            ));
        }

        if config.client.timeout_secs == 0 {
            result.add_warning(ValidationWarning::new(
                "client.timeout_secs",
                "Client invocations are unbounded; a hung scheduler call can block shutdown",
            ));
        }

        if !config.client.trap_signals {
            result.add_warning(ValidationWarning::new(
                "client.trap_signals",
                "Signals are not trapped; a killed job will not notify the scheduler",
            ));
        }
    }

    fn validate_scratch(config: &Config, result: &mut ValidationResult) {
        if config.scratch.prefix.contains('/') {
            result.add_error(ValidationError::new(
                "scratch.prefix",
                "Prefix cannot contain a path separator",
            ));
        }

        if !config.scratch.base_dir.is_dir() {
            result.add_warning(ValidationWarning::new(
                "scratch.base_dir",
                format!(
                    "Scratch base directory does not exist: {}",
                    config.scratch.base_dir.display()
                ),
            ));
        }
    }

    fn validate_task(config: &Config, result: &mut ValidationResult) {
        if config.task.shell.as_os_str().is_empty() {
            result.add_error(ValidationError::new("task.shell", "Shell cannot be empty"));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
