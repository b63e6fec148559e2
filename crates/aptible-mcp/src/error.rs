//! Error types for the MCP server

use aptible_core::{ConfigError, CoreError};
use thiserror::Error;

/// Errors that can occur in the MCP server outside a single API call
#[derive(Error, Debug)]
pub enum McpError {
    /// Configuration could not be loaded or was invalid
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The platform client could not be built or a call failed
    #[error("Aptible API error: {0}")]
    Platform(#[from] CoreError),

    /// Operation not permitted in read-only mode
    #[error("Operation not permitted: server is in read-only mode")]
    ReadOnlyMode,
}

impl From<ConfigError> for McpError {
    fn from(err: ConfigError) -> Self {
        McpError::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_is_a_configuration_error() {
        let err = McpError::from(ConfigError::InvalidUrl {
            field: "api_url",
            value: "not a url".to_string(),
        });
        assert!(matches!(err, McpError::Configuration(_)));
        assert_eq!(
            err.to_string(),
            "Configuration error: Invalid URL for api_url: not a url"
        );
    }

    #[test]
    fn test_core_errors_convert() {
        let err = McpError::from(CoreError::Auth("You are not logged in".to_string()));
        assert!(matches!(err, McpError::Platform(ref e) if e.is_unauthorized()));
    }
}
