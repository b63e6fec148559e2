//! Bearer token lookup
//!
//! Resolution order:
//! 1. An explicit token (from `APTIBLE_TOKEN` or the client builder)
//! 2. The CLI token file, a JSON object mapping auth server URL to token

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};

const NOT_FOUND: &str =
    "Authentication token not found. Log in with the Aptible CLI first or set APTIBLE_TOKEN.";

/// Where a client looks for its bearer token
#[derive(Debug, Clone)]
pub struct TokenStore {
    explicit: Option<String>,
    token_file: Option<PathBuf>,
}

impl TokenStore {
    /// Create a store from an optional explicit token and an optional token file
    pub fn new(explicit: Option<String>, token_file: Option<PathBuf>) -> Self {
        Self {
            explicit: explicit.filter(|t| !t.is_empty()),
            token_file,
        }
    }

    /// Resolve the token for `auth_url`
    pub fn resolve(&self, auth_url: &str) -> Result<String> {
        if let Some(token) = &self.explicit {
            return Ok(token.clone());
        }

        let path = self
            .token_file
            .as_deref()
            .ok_or_else(|| CoreError::Auth(NOT_FOUND.to_string()))?;

        let token = read_token_file(path, auth_url)?;
        if token.is_empty() {
            return Err(CoreError::Auth("You are not logged in".to_string()));
        }
        Ok(token)
    }
}

fn read_token_file(path: &Path, auth_url: &str) -> Result<String> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CoreError::Auth(NOT_FOUND.to_string()));
        }
        Err(e) => {
            return Err(CoreError::Auth(format!(
                "Failed to read token file {}: {}",
                path.display(),
                e
            )));
        }
    };

    let tokens: HashMap<String, String> = serde_json::from_str(&content).map_err(|e| {
        CoreError::Auth(format!(
            "Token file {} is not valid JSON: {}",
            path.display(),
            e
        ))
    })?;

    tokens
        .get(auth_url)
        .cloned()
        .ok_or_else(|| CoreError::Auth(NOT_FOUND.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_tokens(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("tokens.json");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_explicit_token_wins() {
        let dir = TempDir::new().unwrap();
        let path = write_tokens(&dir, r#"{"https://auth.aptible.com": "from-file"}"#);
        let store = TokenStore::new(Some("from-env".to_string()), Some(path));
        assert_eq!(store.resolve("https://auth.aptible.com").unwrap(), "from-env");
    }

    #[test]
    fn test_empty_explicit_token_falls_through() {
        let dir = TempDir::new().unwrap();
        let path = write_tokens(&dir, r#"{"https://auth.aptible.com": "from-file"}"#);
        let store = TokenStore::new(Some(String::new()), Some(path));
        assert_eq!(
            store.resolve("https://auth.aptible.com").unwrap(),
            "from-file"
        );
    }

    #[test]
    fn test_token_file_keyed_by_auth_url() {
        let dir = TempDir::new().unwrap();
        let path = write_tokens(
            &dir,
            r#"{"https://auth.aptible.com": "prod", "https://auth.staging.test": "staging"}"#,
        );
        let store = TokenStore::new(None, Some(path));
        assert_eq!(store.resolve("https://auth.staging.test").unwrap(), "staging");
    }

    #[test]
    fn test_missing_file_is_auth_error() {
        let store = TokenStore::new(None, Some(PathBuf::from("/nonexistent/tokens.json")));
        let err = store.resolve("https://auth.aptible.com").unwrap_err();
        assert!(err.is_unauthorized());
        assert!(err.to_string().contains("token not found"));
    }

    #[test]
    fn test_missing_key_is_auth_error() {
        let dir = TempDir::new().unwrap();
        let path = write_tokens(&dir, r#"{"https://other.test": "x"}"#);
        let store = TokenStore::new(None, Some(path));
        assert!(matches!(
            store.resolve("https://auth.aptible.com"),
            Err(CoreError::Auth(_))
        ));
    }

    #[test]
    fn test_empty_token_means_logged_out() {
        let dir = TempDir::new().unwrap();
        let path = write_tokens(&dir, r#"{"https://auth.aptible.com": ""}"#);
        let store = TokenStore::new(None, Some(path));
        let err = store.resolve("https://auth.aptible.com").unwrap_err();
        assert!(err.to_string().contains("not logged in"));
    }

    #[test]
    fn test_corrupt_file_is_auth_error() {
        let dir = TempDir::new().unwrap();
        let path = write_tokens(&dir, "{not json");
        let store = TokenStore::new(None, Some(path));
        let err = store.resolve("https://auth.aptible.com").unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }
}
