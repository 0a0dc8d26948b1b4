//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester:
//! - Building the HTTP client with user agent and timeouts
//! - GET requests for gallery pages and image payloads
//! - Error classification (timeout, transport, non-success status)
//!
//! There is no retry at this layer.

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::HarvestError;
use reqwest::{Client, Response};
use std::time::Duration;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `crawler` - Crawler settings supplying the request and connect timeouts
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(crawler.request_timeout))
        .connect_timeout(Duration::from_secs(crawler.connect_timeout))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Thin wrapper around a shared [`Client`]
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a fetcher from configuration
    pub fn from_config(
        user_agent: &UserAgentConfig,
        crawler: &CrawlerConfig,
    ) -> Result<Self, HarvestError> {
        Ok(Self::new(build_http_client(user_agent, crawler)?))
    }

    /// Fetches a page body as text
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - Body of a 2xx response
    /// * `Err(HarvestError::HttpStatus)` - Response status was not success
    /// * `Err(HarvestError::Timeout | HarvestError::Network)` - Transport failure
    pub async fn fetch_text(&self, url: &str) -> Result<String, HarvestError> {
        let response = self.get(url).await?;
        response.text().await.map_err(|e| classify(url, e))
    }

    /// Fetches a response body as raw bytes
    ///
    /// Same error contract as [`Fetcher::fetch_text`].
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, HarvestError> {
        let response = self.get(url).await?;
        let bytes = response.bytes().await.map_err(|e| classify(url, e))?;
        Ok(bytes.to_vec())
    }

    async fn get(&self, url: &str) -> Result<Response, HarvestError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }
}

/// Maps a transport error onto the harvest error taxonomy
fn classify(url: &str, error: reqwest::Error) -> HarvestError {
    if error.is_timeout() {
        HarvestError::Timeout {
            url: url.to_string(),
        }
    } else {
        HarvestError::Network {
            url: url.to_string(),
            source: error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn short_timeout_config() -> CrawlerConfig {
        CrawlerConfig {
            request_timeout: 1,
            ..CrawlerConfig::default()
        }
    }

    fn test_fetcher() -> Fetcher {
        Fetcher::from_config(&UserAgentConfig::default(), &short_timeout_config()).unwrap()
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&UserAgentConfig::default(), &CrawlerConfig::default());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_text_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let body = test_fetcher()
            .fetch_text(&format!("{}/", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "<html></html>");
    }

    #[tokio::test]
    async fn test_fetch_bytes_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xD8, 0xFF]))
            .mount(&server)
            .await;

        let bytes = test_fetcher()
            .fetch_bytes(&format!("{}/a.jpg", server.uri()))
            .await
            .unwrap();
        assert_eq!(bytes, vec![0xFF, 0xD8, 0xFF]);
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = test_fetcher()
            .fetch_text(&format!("{}/missing", server.uri()))
            .await;
        assert!(matches!(
            result,
            Err(HarvestError::HttpStatus { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let result = test_fetcher()
            .fetch_bytes(&format!("{}/slow.jpg", server.uri()))
            .await;
        assert!(matches!(result, Err(HarvestError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // Port 9 (discard) is not listening on loopback
        let result = test_fetcher().fetch_text("http://127.0.0.1:9/").await;
        assert!(matches!(result, Err(HarvestError::Network { .. })));
    }
}
