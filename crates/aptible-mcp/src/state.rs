//! Application state and platform client caching

use std::time::Duration;

use aptible_core::{ApiClient, Config, Platform};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::McpError;

/// Shared application state
pub struct AppState {
    /// Read-only mode flag
    pub read_only: bool,
    /// Effective configuration (file, then environment, then CLI flags)
    config: Config,
    /// Platform built on first use
    platform: RwLock<Option<Platform>>,
}

impl AppState {
    /// Create new application state; the API client is built lazily
    pub fn new(config: Config, read_only: bool) -> Self {
        Self {
            read_only,
            config,
            platform: RwLock::new(None),
        }
    }

    /// Create state around an already wired platform
    pub fn with_platform(platform: Platform, read_only: bool) -> Self {
        Self {
            read_only,
            config: Config::default(),
            platform: RwLock::new(Some(platform)),
        }
    }

    /// Effective configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get or create the platform
    pub async fn platform(&self) -> Result<Platform, McpError> {
        // Check cache first
        {
            let cached = self.platform.read().await;
            if let Some(platform) = cached.as_ref() {
                return Ok(platform.clone());
            }
        }

        self.config.validate()?;
        let client = ApiClient::from_config(&self.config)?;
        let platform = Platform::new(client, self.config.poll.options());
        debug!(api_url = %self.config.api_url, "Built platform client");

        {
            let mut cached = self.platform.write().await;
            *cached = Some(platform.clone());
        }

        Ok(platform)
    }

    /// Platform whose mutating calls wait at most `timeout_seconds`
    ///
    /// Without an override the configured poll timeout applies.
    pub async fn platform_with_timeout(
        &self,
        timeout_seconds: Option<u64>,
    ) -> Result<Platform, McpError> {
        let platform = self.platform().await?;
        Ok(match timeout_seconds {
            Some(secs) => platform.with_poll_timeout(Duration::from_secs(secs)),
            None => platform,
        })
    }

    /// Check if write operations are allowed
    pub fn is_write_allowed(&self) -> bool {
        !self.read_only
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_only_blocks_writes() {
        let state = AppState::new(Config::default(), true);
        assert!(!state.is_write_allowed());

        let state = AppState::new(Config::default(), false);
        assert!(state.is_write_allowed());
    }

    #[tokio::test]
    async fn test_platform_is_cached() {
        let config = Config {
            api_url: "https://api.example.test".to_string(),
            token: Some("t".to_string()),
            ..Config::default()
        };
        let state = AppState::new(config, false);

        let first = state.platform().await.unwrap();
        let second = state.platform().await.unwrap();
        assert_eq!(first.client().api_url(), "https://api.example.test");
        assert_eq!(second.client().api_url(), first.client().api_url());
        assert!(state.platform.read().await.is_some());
    }

    #[tokio::test]
    async fn test_timeout_override() {
        let config = Config {
            token: Some("t".to_string()),
            ..Config::default()
        };
        let state = AppState::new(config, false);

        let platform = state.platform_with_timeout(Some(42)).await.unwrap();
        assert_eq!(
            platform.operations.poll_options().timeout,
            Duration::from_secs(42)
        );

        let platform = state.platform_with_timeout(None).await.unwrap();
        assert_eq!(
            platform.operations.poll_options().timeout,
            Duration::from_secs(1800)
        );
    }

    #[tokio::test]
    async fn test_invalid_config_is_reported_before_building() {
        let config = Config {
            api_url: "not a url".to_string(),
            token: Some("t".to_string()),
            ..Config::default()
        };
        let state = AppState::new(config, false);

        let err = state.platform().await.err().unwrap();
        assert!(matches!(err, McpError::Configuration(_)));
        assert!(state.platform.read().await.is_none());
    }
}
