//! Authenticated client for the Aptible platform API
//!
//! Every request carries `Authorization: Bearer <token>` and a HAL+JSON
//! content type. Paths are resolved against the configured API URL unless
//! they are already absolute, which lets callers follow `_links` hrefs and
//! reach the auth server through the same client.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::{Config, TokenStore};
use crate::error::{CoreError, Result};

/// Content type the platform speaks
const HAL_JSON: &str = "application/hal+json";

/// User agent for API requests
const USER_AGENT: &str = concat!("aptible-mcp/", env!("CARGO_PKG_VERSION"));

/// Client for the platform API, cheap to clone
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: Client,
    api_url: String,
    auth_url: String,
    tokens: TokenStore,
    /// First successfully resolved token, kept for the life of the client
    token: RwLock<Option<String>>,
}

/// Builder for [`ApiClient`]
#[derive(Debug, Default)]
pub struct ApiClientBuilder {
    api_url: Option<String>,
    auth_url: Option<String>,
    token: Option<String>,
    token_file: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl ApiClientBuilder {
    /// Base URL of the platform API
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Base URL of the auth server
    pub fn auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = Some(url.into());
        self
    }

    /// Use this bearer token instead of reading the token file
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Token file to consult when no explicit token is set
    pub fn token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_file = Some(path.into());
        self
    }

    /// Per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<ApiClient> {
        let defaults = Config::default();
        let http = Client::builder()
            .timeout(self.timeout.unwrap_or_else(|| defaults.request_timeout()))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(ApiClient {
            inner: Arc::new(Inner {
                http,
                api_url: trim_base(self.api_url.unwrap_or(defaults.api_url)),
                auth_url: trim_base(self.auth_url.unwrap_or(defaults.auth_url)),
                tokens: TokenStore::new(self.token, self.token_file),
                token: RwLock::new(None),
            }),
        })
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

impl ApiClient {
    /// Start building a client
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Build a client from loaded configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut builder = Self::builder()
            .api_url(&config.api_url)
            .auth_url(&config.auth_url)
            .token_file(config.token_file_path()?)
            .timeout(config.request_timeout());
        if let Some(token) = &config.token {
            builder = builder.token(token);
        }
        builder.build()
    }

    /// Configured API base URL
    pub fn api_url(&self) -> &str {
        &self.inner.api_url
    }

    /// Configured auth server base URL
    pub fn auth_url(&self) -> &str {
        &self.inner.auth_url
    }

    /// Bearer token, resolved once and then memoized
    pub async fn token(&self) -> Result<String> {
        {
            let cached = self.inner.token.read().await;
            if let Some(token) = cached.as_ref() {
                return Ok(token.clone());
            }
        }

        let token = self.inner.tokens.resolve(&self.inner.auth_url)?;

        {
            let mut cached = self.inner.token.write().await;
            *cached = Some(token.clone());
        }

        Ok(token)
    }

    /// Resolve a relative path against the API URL; absolute URLs pass through
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.inner.api_url, path)
        }
    }

    /// Make an authenticated GET request
    pub async fn get(&self, path: &str) -> Result<Value> {
        let response = self.send(Method::GET, path, None::<&()>).await?;
        decode(response).await
    }

    /// Make an authenticated POST request with a JSON body
    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        let response = self.send(Method::POST, path, Some(body)).await?;
        decode(response).await
    }

    /// Make an authenticated PUT request with a JSON body
    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        let response = self.send(Method::PUT, path, Some(body)).await?;
        decode(response).await
    }

    /// Make an authenticated DELETE request
    ///
    /// A 204 or an empty body yields `None` instead of a decode attempt.
    pub async fn delete(&self, path: &str) -> Result<Option<Value>> {
        let response = self.send(Method::DELETE, path, None::<&()>).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&body)
            .map(Some)
            .map_err(CoreError::decode)
    }

    /// Make an authenticated GET request and return the raw body
    pub async fn get_text(&self, path: &str) -> Result<String> {
        let response = self.send(Method::GET, path, None::<&()>).await?;
        Ok(response.text().await?)
    }

    /// Fetch a pre-signed URL without credentials
    pub async fn fetch_unauthenticated(&self, url: &str) -> Result<String> {
        debug!(url = %url, "GET (unauthenticated)");
        let response = self.inner.http.get(url).send().await?;
        let response = check_status(response).await?;
        Ok(response.text().await?)
    }

    /// Organization of the logged-in user
    ///
    /// Users may belong to several organizations; the first one is used.
    pub async fn organization_id(&self) -> Result<String> {
        let url = format!("{}/organizations", self.inner.auth_url);
        let body = self.get(&url).await?;
        let first = body
            .pointer("/_embedded/organizations/0")
            .ok_or_else(|| {
                CoreError::NotFound(
                    "Logged in user is not a member of any organizations.".to_string(),
                )
            })?;

        match first.get("id") {
            Some(Value::String(id)) => Ok(id.clone()),
            Some(Value::Number(id)) => Ok(id.to_string()),
            _ => Err(CoreError::Decode(
                "organization entry has no id".to_string(),
            )),
        }
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response> {
        let token = self.token().await?;
        let url = self.url(path);
        debug!(method = %method, url = %url, "API request");

        let mut request = self
            .inner
            .http
            .request(method, &url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, HAL_JSON);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        check_status(response).await
    }
}

/// Turn a non-2xx response into [`CoreError::Api`] carrying status and body
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body
    };
    warn!(status = status.as_u16(), url = %url, "API request failed");

    Err(CoreError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn decode(response: Response) -> Result<Value> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(CoreError::decode)
}
