//! Error types for the document-store client.

use std::fmt;

/// Errors reported by the remote document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// HTTP-level error with status code.
    Http { status: u16, message: String },
    /// Authentication failure.
    Auth { message: String },
    /// Rate limit exceeded.
    RateLimit { retry_after: Option<u64> },
    /// Document not found.
    NotFound { collection: String, id: String },
    /// Store-side validation error.
    Validation {
        field: Option<String>,
        message: String,
    },
    /// Network/connection error.
    Network { message: String },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Http { status, message } => write!(f, "HTTP error {}: {}", status, message),
            ApiError::Auth { message } => write!(f, "Auth error: {}", message),
            ApiError::RateLimit { retry_after } => match retry_after {
                Some(secs) => write!(f, "Rate limited, retry after {} seconds", secs),
                None => write!(f, "Rate limited"),
            },
            ApiError::NotFound { collection, id } => {
                write!(f, "{} document not found: {}", collection, id)
            }
            ApiError::Validation { field, message } => match field {
                Some(f_name) => write!(f, "Validation error on {}: {}", f_name, message),
                None => write!(f, "Validation error: {}", message),
            },
            ApiError::Network { message } => write!(f, "Network error: {}", message),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Returns true if this error is potentially retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::RateLimit { .. } | ApiError::Network { .. })
    }
}

/// Top-level error for remote store operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The store answered with an error.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// The request could not be sent or the response could not be read.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A document could not be encoded or decoded.
    #[error("invalid document: {0}")]
    Json(#[from] serde_json::Error),

    /// A query string could not be encoded.
    #[error("invalid query: {0}")]
    Query(#[from] serde_urlencoded::ser::Error),
}

impl Error {
    /// Returns true if the failure is transient and the call may succeed later.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Api(api) => api.is_retryable(),
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            Error::Json(_) | Error::Query(_) => false,
        }
    }

    /// Returns true if the store could not be reached or failed on its side.
    ///
    /// Authentication and validation failures are not outages.
    pub fn is_unavailable(&self) -> bool {
        match self {
            Error::Api(ApiError::Http { status, .. }) => *status >= 500,
            _ => self.is_retryable(),
        }
    }

    /// Returns true if the store rejected the token.
    pub fn is_auth(&self) -> bool {
        matches!(self, Error::Api(ApiError::Auth { .. }))
    }

    /// Returns true if the store reported that the document does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Api(ApiError::NotFound { .. }))
    }
}

/// Result type for remote store operations.
pub type Result<T> = std::result::Result<T, Error>;
