use super::*;
use std::path::PathBuf;

#[test]
fn test_default_config_is_valid() {
    let result = ConfigValidator::validate(&Config::default());
    assert!(result.is_valid());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_empty_program_is_error() {
    let mut config = Config::default();
    config.client.program = "  ".to_string();

    let result = ConfigValidator::validate(&config);
    assert!(!result.is_valid());
    assert_eq!(result.errors[0].path, "client.program");
}

#[test]
fn test_unbounded_timeout_warns() {
    let mut config = Config::default();
    config.client.timeout_secs = 0;

    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert!(result
        .warnings
        .iter()
        .any(|w| w.path == "client.timeout_secs"));
}

#[test]
fn test_untrapped_signals_warns() {
    let mut config = Config::default();
    config.client.trap_signals = false;

    let result = ConfigValidator::validate(&config);
    assert!(result.warnings.iter().any(|w| w.path == "client.trap_signals"));
}

#[test]
fn test_prefix_with_separator_is_error() {
    let mut config = Config::default();
    config.scratch.prefix = "../escape".to_string();

    let result = ConfigValidator::validate(&config);
    assert!(!result.is_valid());
    assert_eq!(result.errors[0].to_string(), "scratch.prefix: Prefix cannot contain a path separator");
}

#[test]
fn test_missing_base_dir_warns() {
    let mut config = Config::default();
    config.scratch.base_dir = PathBuf::from("/nonexistent/ecfjob/scratch");

    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "scratch.base_dir"));
}

#[test]
fn test_empty_shell_is_error() {
    let mut config = Config::default();
    config.task.shell = PathBuf::new();

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "task.shell"));
}
