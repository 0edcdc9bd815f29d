//! Retry logic for HTTP requests with exponential backoff.

use std::time::Duration;

use tokio::time::sleep;

use crate::error::{ApiError, Error, Result};

/// Default initial backoff duration for retries (1 second).
pub(crate) const DEFAULT_INITIAL_BACKOFF_SECS: u64 = 1;

/// Default maximum backoff duration for retries (30 seconds).
pub(crate) const DEFAULT_MAX_BACKOFF_SECS: u64 = 30;

/// Default maximum number of retry attempts.
pub(crate) const DEFAULT_MAX_RETRIES: u32 = 3;

/// Configuration for retry behavior.
#[derive(Clone, Debug)]
pub(crate) struct RetryConfig {
    /// Maximum number of retry attempts.
    pub max_retries: u32,
    /// Initial backoff duration for retries.
    pub initial_backoff: Duration,
    /// Maximum backoff duration for retries.
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff: Duration::from_secs(DEFAULT_INITIAL_BACKOFF_SECS),
            max_backoff: Duration::from_secs(DEFAULT_MAX_BACKOFF_SECS),
        }
    }
}

impl RetryConfig {
    /// Calculates the backoff duration for a retry attempt.
    ///
    /// If `retry_after` is provided (from a 429 response), uses that value.
    /// Otherwise, uses exponential backoff: initial * 2^attempt, capped at max_backoff.
    pub fn calculate_backoff(&self, attempt: u32, retry_after: Option<u64>) -> Duration {
        let max_backoff = self.max_backoff;
        match retry_after {
            Some(secs) => Duration::from_secs(secs).min(max_backoff),
            None => {
                let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
                self.initial_backoff.saturating_mul(factor).min(max_backoff)
            }
        }
    }
}

fn retry_after_header(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
}

/// Parses an error response into our error types.
///
/// `collection` and `id` name the document for 404 responses.
pub(crate) async fn parse_error_response(
    response: reqwest::Response,
    collection: &str,
    id: &str,
) -> Error {
    let status = response.status();
    let status_code = status.as_u16();
    let retry_after = retry_after_header(&response);

    // Try to get error message from body
    let message = response.text().await.unwrap_or_default();
    let or_default = |message: String, fallback: &str| {
        if message.is_empty() {
            fallback.to_string()
        } else {
            message
        }
    };

    let api_error = match status_code {
        401 | 403 => ApiError::Auth {
            message: or_default(message, "Authentication failed"),
        },
        404 => ApiError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        },
        429 => ApiError::RateLimit { retry_after },
        400 => ApiError::Validation {
            field: None,
            message: or_default(message, "Bad request"),
        },
        _ => ApiError::Http {
            status: status_code,
            message: or_default(
                message,
                status.canonical_reason().unwrap_or("Unknown error"),
            ),
        },
    };

    Error::Api(api_error)
}

/// Sends a request, retrying on 429 responses with backoff.
///
/// Returns the first successful response; any other status becomes an error.
pub(crate) async fn send_with_retry<F, Fut>(
    config: &RetryConfig,
    collection: &str,
    id: &str,
    mut make_request: F,
) -> Result<reqwest::Response>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = std::result::Result<reqwest::Response, reqwest::Error>>,
{
    for attempt in 0..=config.max_retries {
        let response = make_request().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        if status.as_u16() == 429 && attempt < config.max_retries {
            let backoff = config.calculate_backoff(attempt, retry_after_header(&response));
            tracing::debug!(attempt, ?backoff, "rate limited by document store, backing off");
            sleep(backoff).await;
            continue;
        }

        return Err(parse_error_response(response, collection, id).await);
    }

    // All retries exhausted
    Err(Error::Api(ApiError::RateLimit { retry_after: None }))
}
