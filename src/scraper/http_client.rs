use crate::config::ScraperConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Why a page could not be fetched. Callers treat every variant as "no page".
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("failed to read response body: {0}")]
    Body(String),
}

/// Anything that can turn a URL into page markup.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String, FetchError>;
}

pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.page_timeout_secs))
            .gzip(true)
            // Accept cookies so session-based pages work
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { inner })
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    /// Single GET, no retries. A failed page is simply absent this cycle.
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        debug!("GET {} (timeout {:?})", url, timeout);

        let resp = self
            .inner
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = resp.status();
        if !(status.is_success() || status.is_redirection()) {
            return Err(FetchError::Status(status.as_u16()));
        }

        resp.text().await.map_err(|e| FetchError::Body(e.to_string()))
    }
}

fn classify_transport_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if let Some(status) = e.status() {
        FetchError::Status(status.as_u16())
    } else {
        FetchError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn test_client_builds_from_default_config() {
        let config = AppConfig::default();
        assert!(HttpClient::new(&config.scraper).is_ok());
    }

    #[test]
    fn test_fetch_error_messages() {
        assert_eq!(FetchError::Status(404).to_string(), "HTTP status 404");
        assert_eq!(FetchError::Timeout.to_string(), "request timed out");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_an_error_not_a_panic() {
        let config = AppConfig::default();
        let client = HttpClient::new(&config.scraper).unwrap();
        let res = client
            .fetch("http://127.0.0.1:9/course/nothing", Duration::from_millis(500))
            .await;
        assert!(res.is_err());
    }
}
