// Shared HTTP client setup

use std::time::Duration;

use jobdeck_core::error::{AppError, Result};
use reqwest::{Client, RequestBuilder};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Connection settings for the job listing API
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL, without trailing slash
    pub base_url: String,
    /// Sent as `Authorization: Bearer <token>` when present
    pub api_token: Option<String>,
    pub timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl HttpClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

/// reqwest client bound to one API base URL.
///
/// Cheap to clone; the feed and the telemetry sink share one connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    api_token: Option<String>,
}

impl ApiClient {
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(AppError::Config("API base URL must not be empty".to_string()));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            api_token: config.api_token.filter(|token| !token.is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.authorize(self.http.get(self.url(path)))
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.authorize(self.http.post(self.url(path)))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = ApiClient::new(HttpClientConfig::new("http://api.test/v1/")).unwrap();
        assert_eq!(client.base_url(), "http://api.test/v1");
        assert_eq!(client.url("/jobs"), "http://api.test/v1/jobs");
    }

    #[test]
    fn test_empty_base_url_rejected() {
        let err = ApiClient::new(HttpClientConfig::new("/")).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_blank_token_dropped() {
        let config = HttpClientConfig {
            api_token: Some(String::new()),
            ..HttpClientConfig::default()
        };
        let client = ApiClient::new(config).unwrap();
        assert!(client.api_token.is_none());
    }
}
