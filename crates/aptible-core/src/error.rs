//! Unified error handling for aptible-core
//!
//! Every failure a tool caller can see maps onto one variant here:
//! validation problems caught before any request, lookups that matched
//! nothing or too much, upstream HTTP failures, and backend operations
//! that failed or never finished.
//!
//! # Example
//!
//! ```rust
//! use aptible_core::CoreError;
//!
//! let err = CoreError::Api { status: 404, message: "Not Found".to_string() };
//! assert!(err.is_not_found());
//! ```

use std::time::Duration;
use thiserror::Error;

use crate::config::ConfigError;

/// Core error type for all platform operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// A required argument was missing or malformed; raised before any request
    #[error("Validation error: {0}")]
    Validation(String),

    /// A handle or id resolved to nothing
    #[error("{0}")]
    NotFound(String),

    /// A handle resolved to more than one resource
    #[error("{0}")]
    Ambiguous(String),

    /// The API answered with a non-2xx status
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body, or the reason phrase when the body was empty
        message: String,
    },

    /// A backend operation reached the `failed` state
    #[error("Operation {id} failed: {message}")]
    OperationFailed {
        /// Operation id
        id: i64,
        /// Message reported by the backend
        message: String,
    },

    /// A backend operation did not reach a terminal state before the deadline
    #[error("Operation {id} did not finish within {timeout:?}")]
    OperationTimeout {
        /// Operation id
        id: i64,
        /// Deadline that elapsed
        timeout: Duration,
    },

    /// No usable bearer token
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Transport-level failure (connect, TLS, timeout)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A response body did not match the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Returns true if this is a "not found" error (local lookup or HTTP 404)
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::NotFound(_) | CoreError::Api { status: 404, .. }
        )
    }

    /// Returns true if this is an authentication/authorization error (401/403)
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            CoreError::Auth(_) | CoreError::Api {
                status: 401 | 403,
                ..
            }
        )
    }

    /// Returns true if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, CoreError::Api { status, .. } if *status >= 500)
    }

    /// Returns true if this is a timeout error
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            CoreError::Http(e) => e.is_timeout(),
            CoreError::OperationTimeout { .. } => true,
            _ => false,
        }
    }

    /// Returns true if the caller supplied bad or incomplete input
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, CoreError::Validation(_))
    }

    pub(crate) fn decode(err: serde_json::Error) -> Self {
        CoreError::Decode(err.to_string())
    }
}
