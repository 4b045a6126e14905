//! Blocking HTTP client with a User-Agent and an explicit request timeout.

use std::time::Duration;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; nass-revenue/0.1)";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_REDIRECTS: usize = 10;

/// Blocking HTTP client used for state overview pages.
#[derive(Debug)]
pub struct HttpClient {
    inner: reqwest::blocking::Client,
}

impl HttpClient {
    /// Builder for custom User-Agent and/or timeout.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Perform a single GET request. No retries; a timeout surfaces as an error.
    pub fn get(&self, url: reqwest::Url) -> Result<reqwest::blocking::Response, reqwest::Error> {
        self.inner.get(url).send()
    }
}

/// Builder for HttpClient with optional User-Agent and timeout.
#[derive(Debug)]
pub struct HttpClientBuilder {
    user_agent: Option<String>,
    timeout_secs: u64,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            user_agent: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl HttpClientBuilder {
    /// Set a custom User-Agent.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Set request timeout in seconds. Default 30; zero is raised to one.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs.max(1);
        self
    }

    pub fn build(self) -> Result<HttpClient, reqwest::Error> {
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let inner = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(self.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(HttpClient { inner })
    }
}
