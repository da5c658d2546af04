//! Shared HTTP client for the backend services.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, Secret};
use url::Url;

/// Connection settings for the backend.
#[derive(Debug, Clone)]
pub struct RestClientConfig {
    pub base_url: Url,
    /// Sent as a bearer token when present.
    api_token: Option<Secret<String>>,
    pub timeout: Duration,
}

impl RestClientConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            api_token: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_api_token(mut self, token: Secret<String>) -> Self {
        self.api_token = Some(token);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A configured `reqwest` client plus URL building. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RestClient {
    config: RestClientConfig,
    client: Client,
}

impl RestClient {
    pub fn new(config: RestClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    /// Base URL with `segments` appended, each percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.config.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub fn get(&self, url: Url) -> RequestBuilder {
        self.authorize(self.client.get(url))
    }

    pub fn put(&self, url: Url) -> RequestBuilder {
        self.authorize(self.client.put(url))
    }

    pub fn post(&self, url: Url) -> RequestBuilder {
        self.authorize(self.client.post(url))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }
}

/// Short description of a transport failure for error messages.
pub(super) fn describe(error: &reqwest::Error, timeout: Duration) -> String {
    if error.is_timeout() {
        format!("timed out after {}s", timeout.as_secs())
    } else if error.is_connect() {
        format!("connection failed: {error}")
    } else {
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> RestClient {
        RestClient::new(RestClientConfig::new(Url::parse(base).unwrap())).unwrap()
    }

    #[test]
    fn endpoint_appends_encoded_segments() {
        let url = client("http://api.local/v1").endpoint(&["proposals", "prop 1", "sections", "s/2"]);
        assert_eq!(url.as_str(), "http://api.local/v1/proposals/prop%201/sections/s%2F2");
    }

    #[test]
    fn endpoint_handles_trailing_slash() {
        let url = client("http://api.local/v1/").endpoint(&["export", "pdf"]);
        assert_eq!(url.as_str(), "http://api.local/v1/export/pdf");
    }

    #[test]
    fn config_debug_hides_token() {
        let config = RestClientConfig::new(Url::parse("http://api.local").unwrap())
            .with_api_token(Secret::new("hunter2".to_string()));
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
