//! Unit tests for configuration resolution and graceful degradation
//!
//! Covers:
//! - Priority order: CLI > ROBOT_SERVER > config file > compiled default
//! - Missing or malformed config files never abort resolution
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate ROBOT_SERVER are marked with #[serial].

use robot_common::config::{
    ClientConfig, ConfigResolver, TomlConfig, DEFAULT_SERVER, DEFAULT_CONNECT_TIMEOUT_SECS, SERVER_ENV_VAR,
};
use serial_test::serial;
use std::env;
use std::io::Write;
use tempfile::NamedTempFile;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp config");
    file.write_all(contents.as_bytes()).expect("write temp config");
    file
}

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    env::remove_var(SERVER_ENV_VAR);

    let resolver = ConfigResolver::with_config_file("/nonexistent/robot/config.toml");
    let config = resolver.resolve(None);

    assert_eq!(config, ClientConfig::default());
    assert_eq!(config.server, DEFAULT_SERVER);
}

#[test]
#[serial]
fn test_cli_argument_has_highest_priority() {
    env::set_var(SERVER_ENV_VAR, "http://from-env:1");
    let file = config_file("server = \"http://from-file:2\"\n");

    let resolver = ConfigResolver::with_config_file(file.path());
    let config = resolver.resolve(Some("http://from-cli:3"));

    assert_eq!(config.server, "http://from-cli:3");

    env::remove_var(SERVER_ENV_VAR);
}

#[test]
#[serial]
fn test_env_var_beats_config_file() {
    env::set_var(SERVER_ENV_VAR, "http://from-env:1");
    let file = config_file("server = \"http://from-file:2\"\n");

    let resolver = ConfigResolver::with_config_file(file.path());
    let config = resolver.resolve(None);

    assert_eq!(config.server, "http://from-env:1");

    env::remove_var(SERVER_ENV_VAR);
}

#[test]
#[serial]
fn test_config_file_used_when_no_cli_or_env() {
    env::remove_var(SERVER_ENV_VAR);
    let file = config_file("server = \"http://from-file:2\"\nconnect_timeout_secs = 7\n");

    let resolver = ConfigResolver::with_config_file(file.path());
    let config = resolver.resolve(None);

    assert_eq!(config.server, "http://from-file:2");
    assert_eq!(config.connect_timeout_secs, 7);
}

#[test]
#[serial]
fn test_timeout_from_file_applies_even_with_cli_server() {
    env::remove_var(SERVER_ENV_VAR);
    let file = config_file("connect_timeout_secs = 12\n");

    let resolver = ConfigResolver::with_config_file(file.path());
    let config = resolver.resolve(Some("http://from-cli:3"));

    assert_eq!(config.server, "http://from-cli:3");
    assert_eq!(config.connect_timeout_secs, 12);
}

#[test]
#[serial]
fn test_malformed_config_file_falls_back_to_defaults() {
    env::remove_var(SERVER_ENV_VAR);
    let file = config_file("server = [this is not toml");

    let resolver = ConfigResolver::with_config_file(file.path());
    let config = resolver.resolve(None);

    assert_eq!(config.server, DEFAULT_SERVER);
    assert_eq!(config.connect_timeout_secs, DEFAULT_CONNECT_TIMEOUT_SECS);
}

#[test]
#[serial]
fn test_blank_cli_and_env_values_are_ignored() {
    env::set_var(SERVER_ENV_VAR, "   ");

    let resolver = ConfigResolver::with_config_file("/nonexistent/robot/config.toml");
    let config = resolver.resolve(Some(""));

    assert_eq!(config.server, DEFAULT_SERVER);

    env::remove_var(SERVER_ENV_VAR);
}

#[test]
fn test_toml_config_load_reports_path_on_error() {
    let file = config_file("connect_timeout_secs = \"soon\"");
    let err = TomlConfig::load(file.path()).unwrap_err();
    assert!(err.to_string().contains(&file.path().display().to_string()));
}
