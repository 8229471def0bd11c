//! Configuration loader.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::schema::Config;

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a file, falling back to defaults when it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::NotFound(_)) => Ok(Config::default()),
            other => other,
        }
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let mut config: Config = toml::from_str(&expanded)?;

        config.scratch.base_dir = Self::expand_pathbuf(&config.scratch.base_dir);
        config.logging.dir = config.logging.dir.as_deref().map(Self::expand_pathbuf);
        config.task.shell = Self::expand_pathbuf(&config.task.shell);
        Ok(config)
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();
        let re = regex::Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.ecfjob`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }

    fn expand_pathbuf(path: &Path) -> PathBuf {
        match path.to_str() {
            Some(s) => PathBuf::from(Self::expand_path(s)),
            None => path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_empty_config() {
        let config = ConfigLoader::load_str("").unwrap();
        assert_eq!(config.client.program, "ecflow_client");
    }

    #[test]
    fn test_expand_path() {
        let expanded = ConfigLoader::expand_path("~/.ecfjob");
        assert!(!expanded.starts_with('~'));
    }

    #[test]
    fn test_scratch_dir_tilde_expanded() {
        let config = ConfigLoader::load_str("[scratch]\nbase_dir = \"~/scratch\"\n").unwrap();
        assert!(!config.scratch.base_dir.starts_with("~"));
        assert!(config.scratch.base_dir.ends_with("scratch"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[client]").unwrap();
        writeln!(file, "timeout_secs = 7").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.client.timeout_secs, 7);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/ecfjob.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config =
            ConfigLoader::load_or_default(Path::new("/nonexistent/path/ecfjob.toml")).unwrap();
        assert_eq!(config.client.timeout_secs, 60);
    }

    #[test]
    fn test_load_invalid_toml() {
        let result = ConfigLoader::load_str("invalid = [unclosed");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    #[serial]
    fn test_env_var_substitution() {
        // SAFETY: serialized test, no other thread touches the environment.
        unsafe { std::env::set_var("ECFJOB_TEST_CLIENT", "/usr/local/bin/ecflow_client") };

        let config =
            ConfigLoader::load_str("[client]\nprogram = \"${ECFJOB_TEST_CLIENT}\"\n").unwrap();
        assert_eq!(config.client.program, "/usr/local/bin/ecflow_client");

        // SAFETY: as above.
        unsafe { std::env::remove_var("ECFJOB_TEST_CLIENT") };
    }

    #[test]
    fn test_env_var_missing() {
        let result = ConfigLoader::load_str("[client]\nprogram = \"${ECFJOB_SURELY_UNSET_VAR}\"\n");
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(_))));
    }
}
