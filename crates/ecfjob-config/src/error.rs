//! Configuration errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Invalid config: {0}")]
    InvalidFormat(String),

    /// One or more mandatory job identity parameters are absent.
    #[error("Missing mandatory job parameters: {}", .0.join(", "))]
    MissingParameters(Vec<String>),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let err = ConfigError::NotFound("ecfjob.toml".to_string());
        assert!(err.to_string().contains("ecfjob.toml"));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_missing_parameters_lists_every_key() {
        let err = ConfigError::MissingParameters(vec![
            "ECF_NAME".to_string(),
            "ECF_TRYNO".to_string(),
        ]);
        let display = err.to_string();
        assert!(display.contains("ECF_NAME, ECF_TRYNO"));
        assert!(display.contains("Missing"));
    }

    #[test]
    fn test_invalid_value_error() {
        let err = ConfigError::InvalidValue {
            field: "ECF_PORT".to_string(),
            message: "not a port number".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("ECF_PORT"));
        assert!(display.contains("not a port number"));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = ConfigError::from(io_err);
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_env_var_not_set_error() {
        let err = ConfigError::EnvVarNotSet("ECF_HOME".to_string());
        assert!(err.to_string().contains("ECF_HOME"));
        assert!(err.to_string().contains("not set"));
    }
}
