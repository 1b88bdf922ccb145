//! Retry classification for index requests.

use reqwest::StatusCode;

/// Maximum number of attempts for one request.
pub const MAX_RETRIES: usize = 3;

/// Delay between attempts in milliseconds.
pub const RETRY_DELAY_MS: u64 = 1000;

/// Failures that a retry (or a fallback index) would not fix.
#[derive(Debug)]
pub enum NonRetryableError {
    /// HTTP 404: the index does not know the package.
    NotFound(String),
    /// HTTP 401
    AuthenticationFailed(String),
    /// HTTP 403
    Forbidden(String),
    /// HTTP 429
    RateLimitExceeded(String),
    /// Any other 4xx
    ClientError(String),
}

impl std::fmt::Display for NonRetryableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NonRetryableError::NotFound(msg) => write!(f, "Not found: {}", msg),
            NonRetryableError::AuthenticationFailed(msg) => {
                write!(f, "Authentication failed: {}. Check the credentials in the index URL.", msg)
            }
            NonRetryableError::Forbidden(msg) => write!(f, "Access forbidden: {}", msg),
            NonRetryableError::RateLimitExceeded(msg) => {
                write!(f, "Rate limit exceeded: {}. Try again later.", msg)
            }
            NonRetryableError::ClientError(msg) => write!(f, "Request error: {}", msg),
        }
    }
}

impl std::error::Error for NonRetryableError {}

/// Classifies an error as retryable or non-retryable.
/// Returns Ok(()) if the error is retryable, Err with a user-friendly message if not.
pub fn classify_error(error: &reqwest::Error) -> Result<(), NonRetryableError> {
    let Some(status) = error.status() else {
        // Connection errors, timeouts and the like.
        return Ok(());
    };
    let url = error
        .url()
        .map(|u| u.to_string())
        .unwrap_or_else(|| "the requested resource".to_string());

    match status {
        StatusCode::NOT_FOUND => Err(NonRetryableError::NotFound(url)),
        StatusCode::UNAUTHORIZED => Err(NonRetryableError::AuthenticationFailed(url)),
        StatusCode::FORBIDDEN => Err(NonRetryableError::Forbidden(url)),
        StatusCode::TOO_MANY_REQUESTS => Err(NonRetryableError::RateLimitExceeded(url)),
        s if s.is_client_error() => Err(NonRetryableError::ClientError(format!(
            "HTTP {} from {}",
            s.as_u16(),
            url
        ))),
        // 5xx
        _ => Ok(()),
    }
}

/// Converts an `error_for_status()` failure into an `anyhow::Error`, wrapping
/// non-retryable ones in [`NonRetryableError`].
pub fn check_retryable(error: reqwest::Error) -> anyhow::Error {
    match classify_error(&error) {
        Ok(()) => anyhow::Error::from(error),
        Err(non_retryable) => anyhow::Error::from(non_retryable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn status_error(status: usize) -> reqwest::Error {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/")
            .with_status(status)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let response = client.get(server.url()).send().await.unwrap();
        response.error_for_status().unwrap_err()
    }

    #[test]
    fn test_non_retryable_error_display() {
        let err = NonRetryableError::NotFound("https://pypi.org/simple/x/".to_string());
        assert_eq!(err.to_string(), "Not found: https://pypi.org/simple/x/");

        let err = NonRetryableError::RateLimitExceeded("test".to_string());
        assert!(err.to_string().contains("Rate limit"));
        assert!(!err.to_string().contains("GITHUB_TOKEN"));

        let err = NonRetryableError::ClientError("HTTP 400".to_string());
        assert!(err.to_string().contains("Request error"));
    }

    #[tokio::test]
    async fn test_classify_error_statuses() {
        assert!(matches!(
            classify_error(&status_error(404).await),
            Err(NonRetryableError::NotFound(_))
        ));
        assert!(matches!(
            classify_error(&status_error(401).await),
            Err(NonRetryableError::AuthenticationFailed(_))
        ));
        assert!(matches!(
            classify_error(&status_error(403).await),
            Err(NonRetryableError::Forbidden(_))
        ));
        assert!(matches!(
            classify_error(&status_error(429).await),
            Err(NonRetryableError::RateLimitExceeded(_))
        ));
        assert!(matches!(
            classify_error(&status_error(400).await),
            Err(NonRetryableError::ClientError(_))
        ));
    }

    #[tokio::test]
    async fn test_server_errors_are_retryable() {
        assert!(classify_error(&status_error(500).await).is_ok());
        let err = check_retryable(status_error(503).await);
        assert!(err.downcast_ref::<NonRetryableError>().is_none());
    }

    #[tokio::test]
    async fn test_check_retryable_wraps_not_found() {
        let err = check_retryable(status_error(404).await);
        assert!(matches!(
            err.downcast_ref::<NonRetryableError>(),
            Some(NonRetryableError::NotFound(_))
        ));
    }
}
