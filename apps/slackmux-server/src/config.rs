//! Server configuration types and loading.
//!
//! Defines [`ServerConfig`] which is loaded from `~/.slackmux/config.yml`
//! (or the file named by `SLACKMUX_CONFIG`). Every field has a default, so
//! a missing file yields a usable local configuration.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ServerError;

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "SLACKMUX_CONFIG";

/// Environment variable supplying the signing secret when the file has none.
pub const SIGNING_SECRET_ENV: &str = "SLACK_SIGNING_SECRET";

/// Top-level server configuration.
///
/// ```yaml
/// listen: "0.0.0.0:3000"
/// path: "/slack/interactions"
/// signing_secret: "8f742231b10e8888abcd99yyyzzz85a5"
/// relay:
///   connect_timeout_secs: 5
///   timeout_secs: 15
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// Path Slack posts interactions to.
    #[serde(default = "default_path")]
    pub path: String,

    /// Slack app signing secret. Requests are not verified when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_secret: Option<String>,

    /// Timeouts of the client relaying messages to `response_url`s.
    #[serde(default)]
    pub relay: RelayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_path() -> String {
    "/slack/interactions".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    slackmux::DEFAULT_CONNECT_TIMEOUT.as_secs()
}

fn default_timeout_secs() -> u64 {
    slackmux::DEFAULT_REQUEST_TIMEOUT.as_secs()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            path: default_path(),
            signing_secret: None,
            relay: RelayConfig::default(),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RelayConfig {
    /// Builds the relay client with the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::HttpClient` if the TLS backend cannot be initialized.
    pub fn http_client(&self) -> Result<reqwest::Client, ServerError> {
        Ok(reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?)
    }
}

/// Returns the config file path: `$SLACKMUX_CONFIG` or `~/.slackmux/config.yml`.
///
/// # Errors
///
/// Returns `ServerError::Config` if neither `SLACKMUX_CONFIG` nor `HOME` is set.
pub fn default_config_path() -> Result<PathBuf, ServerError> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }
    let home = std::env::var("HOME")
        .map_err(|_| ServerError::Config("HOME environment variable not set".into()))?;
    Ok(PathBuf::from(home).join(".slackmux").join("config.yml"))
}

impl ServerConfig {
    /// Loads configuration from the given YAML file path.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if the file cannot be read, contains
    /// invalid YAML, or fails validation.
    pub fn load(path: &Path) -> Result<Self, ServerError> {
        info!(path = %path.display(), "Loading configuration");
        let content = std::fs::read_to_string(path).map_err(|e| {
            ServerError::Config(format!("Cannot read config at {}: {e}", path.display()))
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| {
            ServerError::Config(format!("Invalid YAML in config at {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise returns the defaults.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if the file exists but is invalid.
    pub fn load_or_default(path: &Path) -> Result<Self, ServerError> {
        if path.exists() {
            Self::load(path)
        } else {
            info!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Fills the signing secret from `SLACK_SIGNING_SECRET` when the file
    /// does not set one.
    pub fn apply_env(&mut self) {
        if self.signing_secret.is_none() {
            self.signing_secret = std::env::var(SIGNING_SECRET_ENV)
                .ok()
                .filter(|s| !s.is_empty());
        }
    }

    /// Validates that required fields are present and well-formed.
    fn validate(&self) -> Result<(), ServerError> {
        if !self.path.starts_with('/') {
            return Err(ServerError::Config("path must start with '/'".into()));
        }
        if self
            .signing_secret
            .as_ref()
            .is_some_and(|secret| secret.is_empty())
        {
            return Err(ServerError::Config(
                "signing_secret must not be empty when set".into(),
            ));
        }
        if self.relay.connect_timeout_secs == 0 || self.relay.timeout_secs == 0 {
            return Err(ServerError::Config(
                "relay timeouts must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_deserialize_full_config() {
        let yaml = r#"
listen: "0.0.0.0:8080"
path: "/hooks/slack"
signing_secret: "abc123"
relay:
  connect_timeout_secs: 5
  timeout_secs: 15
"#;
        let config: ServerConfig = serde_yaml::from_str(yaml).expect("deserialize");
        assert_eq!(config.listen.port(), 8080);
        assert_eq!(config.path, "/hooks/slack");
        assert_eq!(config.signing_secret.as_deref(), Some("abc123"));
        assert_eq!(config.relay.connect_timeout_secs, 5);
        assert_eq!(config.relay.timeout_secs, 15);
    }

    #[test]
    fn test_should_default_missing_fields() {
        let config: ServerConfig = serde_yaml::from_str("{}").expect("deserialize");
        assert_eq!(config.listen, default_listen());
        assert_eq!(config.path, "/slack/interactions");
        assert!(config.signing_secret.is_none());
        assert_eq!(config.relay.timeout_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_should_default_partial_relay_section() {
        let yaml = "relay:\n  timeout_secs: 3\n";
        let config: ServerConfig = serde_yaml::from_str(yaml).expect("deserialize");
        assert_eq!(config.relay.timeout_secs, 3);
        assert_eq!(config.relay.connect_timeout_secs, 10);
    }

    #[test]
    fn test_should_reject_relative_path() {
        let config = ServerConfig {
            path: "slack".into(),
            ..ServerConfig::default()
        };
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("path"));
    }

    #[test]
    fn test_should_reject_empty_signing_secret() {
        let config = ServerConfig {
            signing_secret: Some(String::new()),
            ..ServerConfig::default()
        };
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("signing_secret"));
    }

    #[test]
    fn test_should_reject_zero_timeout() {
        let config = ServerConfig {
            relay: RelayConfig {
                connect_timeout_secs: 0,
                timeout_secs: 30,
            },
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_should_load_from_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("config.yml");
        std::fs::write(&path, "listen: \"127.0.0.1:4000\"\n").expect("write config");

        let config = ServerConfig::load(&path).expect("load");
        assert_eq!(config.listen.port(), 4000);
    }

    #[test]
    fn test_should_error_on_missing_file() {
        let result = ServerConfig::load(Path::new("/nonexistent/config.yml"));
        assert!(result.unwrap_err().to_string().contains("Cannot read"));
    }

    #[test]
    fn test_should_use_defaults_when_file_absent() {
        let config =
            ServerConfig::load_or_default(Path::new("/nonexistent/config.yml")).expect("default");
        assert_eq!(config.path, "/slack/interactions");
    }

    #[test]
    fn test_should_reject_invalid_yaml() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("config.yml");
        std::fs::write(&path, "listen: [not, an, address]\n").expect("write config");

        let err = ServerConfig::load_or_default(&path).unwrap_err().to_string();
        assert!(err.contains("Invalid YAML"));
    }

    #[test]
    fn test_should_build_relay_client() {
        assert!(RelayConfig::default().http_client().is_ok());
    }
}
