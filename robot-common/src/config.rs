//! Configuration loading and server address resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Environment variable consulted when `--server` is not given
pub const SERVER_ENV_VAR: &str = "ROBOT_SERVER";

/// Compiled fallback server address
pub const DEFAULT_SERVER: &str = "http://localhost:8081";

/// Default connection-establishment timeout, in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Client configuration shared by every verb
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the build tracking server
    pub server: String,
    /// Seconds allowed to establish a connection. Transfers themselves are
    /// never cut off, so long searches and large uploads run to completion.
    pub connect_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

/// On-disk configuration file contents
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub server: Option<String>,
    pub connect_timeout_secs: Option<u64>,
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }
}

/// Resolves the client configuration following this priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. Compiled default (fallback)
pub struct ConfigResolver {
    config_file: Option<PathBuf>,
}

impl ConfigResolver {
    /// Resolver that looks for the config file in the platform locations
    pub fn new() -> Self {
        Self {
            config_file: default_config_file(),
        }
    }

    /// Resolver bound to an explicit config file path
    pub fn with_config_file(path: impl Into<PathBuf>) -> Self {
        Self {
            config_file: Some(path.into()),
        }
    }

    /// Produce the effective configuration
    ///
    /// A missing or unreadable config file is not fatal: it is reported and
    /// resolution falls through to the compiled defaults.
    pub fn resolve(&self, cli_server: Option<&str>) -> ClientConfig {
        let file = self.load_file();
        let mut config = ClientConfig::default();

        if let Some(timeout) = file.connect_timeout_secs {
            config.connect_timeout_secs = timeout;
        }

        // Priority 1: Command-line argument
        if let Some(server) = cli_server.filter(|s| !s.trim().is_empty()) {
            config.server = server.to_string();
            return config;
        }

        // Priority 2: Environment variable
        if let Ok(server) = std::env::var(SERVER_ENV_VAR) {
            if !server.trim().is_empty() {
                config.server = server;
                return config;
            }
        }

        // Priority 3: TOML config file
        if let Some(server) = file.server {
            config.server = server;
        }

        // Priority 4: compiled default already in place
        config
    }

    fn load_file(&self) -> TomlConfig {
        let Some(path) = &self.config_file else {
            return TomlConfig::default();
        };
        if !path.exists() {
            return TomlConfig::default();
        }
        match TomlConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring config file: {}", e);
                TomlConfig::default()
            }
        }
    }
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Get default configuration file path for the platform
fn default_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("robot").join("config.toml"));

    if cfg!(target_os = "linux") {
        // Try ~/.config/robot/config.toml first, then /etc/robot/config.toml
        if let Some(path) = &user_config {
            if path.exists() {
                return user_config;
            }
        }
        let system_config = PathBuf::from("/etc/robot/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
        None
    } else {
        user_config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.server, DEFAULT_SERVER);
        assert_eq!(config.connect_timeout_secs, DEFAULT_CONNECT_TIMEOUT_SECS);
    }

    #[test]
    fn test_toml_config_parses_partial_file() {
        let config: TomlConfig = toml::from_str("server = \"http://build:9000\"").unwrap();
        assert_eq!(config.server.as_deref(), Some("http://build:9000"));
        assert!(config.connect_timeout_secs.is_none());
    }
}
