//! Configuration management for Aptible tooling
//!
//! Handles configuration loading from files and environment variables.
//! Configuration is stored in TOML format:
//!
//! ```toml
//! api_url = "https://api.aptible.com"
//! auth_url = "https://auth.aptible.com"
//! token_file = "~/.aptible/tokens.json"
//! request_timeout_secs = 30
//!
//! [poll]
//! interval_ms = 1000
//! max_interval_ms = 10000
//! timeout_secs = 1800
//! ```

use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::error::ConfigError;
use crate::progress::PollOptions;

type Result<T> = std::result::Result<T, ConfigError>;

/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "APTIBLE_API_URL";
/// Environment variable overriding the auth server URL
pub const AUTH_URL_ENV: &str = "APTIBLE_AUTH_URL";
/// Environment variable carrying a bearer token directly
pub const TOKEN_ENV: &str = "APTIBLE_TOKEN";

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Base URL of the platform API
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Base URL of the auth server; also the key into the token file
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    /// Path to the CLI token file (defaults to `~/.aptible/tokens.json`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_file: Option<String>,
    /// Per-request timeout
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Operation polling settings
    #[serde(default)]
    pub poll: PollConfig,
    /// Bearer token from the environment; never read from or written to disk
    #[serde(skip)]
    pub token: Option<String>,
}

/// How long and how often to poll backend operations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay before the second poll
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Upper bound for the doubling delay
    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,
    /// Give up after this long
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            auth_url: default_auth_url(),
            token_file: None,
            request_timeout_secs: default_request_timeout(),
            poll: PollConfig::default(),
            token: None,
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_interval_ms: default_max_interval_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl PollConfig {
    /// Convert into poller options
    pub fn options(&self) -> PollOptions {
        PollOptions {
            interval: Duration::from_millis(self.interval_ms),
            max_interval: Duration::from_millis(self.max_interval_ms),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

impl Config {
    /// Load configuration from the standard location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::LoadError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        // Expand environment variables in the config content
        let expanded_content = Self::expand_env_vars(&content);

        let config: Config = toml::from_str(&expanded_content)?;
        config.validate()?;

        Ok(config)
    }

    /// Apply `APTIBLE_API_URL`, `APTIBLE_AUTH_URL` and `APTIBLE_TOKEN`
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(url) = non_empty_env(API_URL_ENV) {
            self.api_url = url;
        }
        if let Some(url) = non_empty_env(AUTH_URL_ENV) {
            self.auth_url = url;
        }
        if let Some(token) = non_empty_env(TOKEN_ENV) {
            self.token = Some(token);
        }
        self
    }

    /// Check that both base URLs parse
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [("api_url", &self.api_url), ("auth_url", &self.auth_url)] {
            url::Url::parse(value).map_err(|_| ConfigError::InvalidUrl {
                field,
                value: value.clone(),
            })?;
        }
        Ok(())
    }

    /// Resolve the token file location, expanding a leading `~`
    pub fn token_file_path(&self) -> Result<PathBuf> {
        match &self.token_file {
            Some(path) => Ok(PathBuf::from(shellexpand::tilde(path).as_ref())),
            None => {
                let base_dirs = BaseDirs::new().ok_or(ConfigError::ConfigDirError)?;
                Ok(base_dirs.home_dir().join(".aptible").join("tokens.json"))
            }
        }
    }

    /// Per-request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Render the effective configuration with the token masked
    pub fn redacted(&self) -> serde_json::Value {
        serde_json::json!({
            "api_url": self.api_url,
            "auth_url": self.auth_url,
            "token_file": self.token_file_path().ok().map(|p| p.display().to_string()),
            "token": self.token.as_ref().map(|_| "********"),
            "request_timeout_secs": self.request_timeout_secs,
            "poll": self.poll,
        })
    }

    /// Get the path to the configuration file
    ///
    /// On macOS, `~/.config/aptible-mcp/config.toml` wins when it exists.
    /// Elsewhere: the platform config dir (`~/.config/aptible-mcp/config.toml`
    /// on Linux, `%APPDATA%\aptible\aptible-mcp\config.toml` on Windows).
    pub fn config_path() -> Result<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            if let Some(base_dirs) = BaseDirs::new() {
                let linux_style_path = base_dirs
                    .home_dir()
                    .join(".config")
                    .join("aptible-mcp")
                    .join("config.toml");
                if linux_style_path.exists() {
                    return Ok(linux_style_path);
                }
            }
        }

        let proj_dirs =
            ProjectDirs::from("com", "aptible", "aptible-mcp").ok_or(ConfigError::ConfigDirError)?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Expand environment variables in configuration content
    ///
    /// Supports ${VAR} and ${VAR:-default}; unset variables are left as-is.
    fn expand_env_vars(content: &str) -> String {
        let expanded =
            shellexpand::env_with_context_no_errors(content, |var| std::env::var(var).ok());
        expanded.to_string()
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn default_api_url() -> String {
    "https://api.aptible.com".to_string()
}

fn default_auth_url() -> String {
    "https://auth.aptible.com".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_max_interval_ms() -> u64 {
    10_000
}

fn default_timeout_secs() -> u64 {
    1800
}
