//! HTTP client with built-in retry logic and error handling.

use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, warn};
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};

use super::retry::{MAX_RETRIES, NonRetryableError, RETRY_DELAY_MS, check_retryable};

pub const USER_AGENT: &str = concat!("requirements-cli/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A response body with its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextResponse {
    pub content_type: Option<String>,
    pub body: String,
}

/// HTTP client with built-in retry logic for network operations.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    retry_delay: Duration,
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
        }
    }

    /// A client with the crate's user agent and request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self::new(client))
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Performs a GET request with the given `Accept` header and returns the
    /// body as text. Automatically retries on transient errors.
    #[tracing::instrument(skip(self))]
    pub async fn get_text(&self, url: &str, accept: &str) -> Result<TextResponse> {
        debug!("GET {}...", url);

        self.with_retry("GET", || async {
            let response = self
                .client
                .get(url)
                .header(ACCEPT, accept)
                .send()
                .await
                .context("Failed to send request")?;

            let response = response.error_for_status().map_err(check_retryable)?;

            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response
                .text()
                .await
                .context("Failed to read response body")?;

            Ok(TextResponse { content_type, body })
        })
        .await
    }

    /// Executes an async operation with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation_name: &str, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 1..=MAX_RETRIES {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if !is_retryable_error(&e) {
                        debug!("{}: non-retryable error: {}", operation_name, e);
                        return Err(e);
                    }

                    if attempt < MAX_RETRIES {
                        warn!(
                            "{}: attempt {}/{} failed ({}), retrying in {}ms...",
                            operation_name,
                            attempt,
                            MAX_RETRIES,
                            e,
                            self.retry_delay.as_millis()
                        );
                        tokio::time::sleep(self.retry_delay).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            anyhow::anyhow!("{}: failed after {} attempts", operation_name, MAX_RETRIES)
        }))
    }
}

fn is_retryable_error(e: &anyhow::Error) -> bool {
    e.downcast_ref::<NonRetryableError>().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn client() -> HttpClient {
        HttpClient::new(Client::new()).with_retry_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_get_text_success() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/simple/django/")
            .match_header("accept", "application/vnd.pypi.simple.v1+json")
            .with_status(200)
            .with_header("content-type", "application/vnd.pypi.simple.v1+json")
            .with_body(r#"{"files": []}"#)
            .create_async()
            .await;

        let response = client()
            .get_text(
                &format!("{}/simple/django/", url),
                "application/vnd.pypi.simple.v1+json",
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.body, r#"{"files": []}"#);
        assert_eq!(
            response.content_type.as_deref(),
            Some("application/vnd.pypi.simple.v1+json")
        );
    }

    #[tokio::test]
    async fn test_get_text_not_found_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/missing/")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let result = client().get_text(&format!("{}/missing/", url), "text/html").await;

        mock.assert_async().await;
        let err = result.unwrap_err();
        assert!(err.downcast_ref::<NonRetryableError>().is_some());
    }

    #[tokio::test]
    async fn test_get_text_retries_server_errors() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/flaky/")
            .with_status(503)
            .expect(MAX_RETRIES)
            .create_async()
            .await;

        let result = client().get_text(&format!("{}/flaky/", url), "text/html").await;

        mock.assert_async().await;
        assert!(result.is_err());
    }

    #[test]
    fn test_is_retryable_error() {
        let err = anyhow::Error::from(NonRetryableError::NotFound("test".to_string()));
        assert!(!is_retryable_error(&err));

        let err = anyhow::anyhow!("connection reset by peer");
        assert!(is_retryable_error(&err));
    }

    #[tokio::test]
    async fn test_with_retry_success() {
        let result = client()
            .with_retry("test", || async { Ok::<_, anyhow::Error>("success") })
            .await;
        assert_eq!(result.unwrap(), "success");
    }

    #[tokio::test]
    async fn test_with_retry_retries_on_network_error() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let result = client()
            .with_retry("test", || {
                let count = call_count_clone.clone();
                async move {
                    let current = count.fetch_add(1, Ordering::SeqCst);
                    if current < 2 {
                        Err::<&str, _>(anyhow::anyhow!("connection reset"))
                    } else {
                        Ok("success after retries")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "success after retries");
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_exhausts_retries() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let result = client()
            .with_retry("test", || {
                let count = call_count_clone.clone();
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(anyhow::anyhow!("connection timeout"))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(call_count.load(Ordering::SeqCst), MAX_RETRIES);
    }
}
