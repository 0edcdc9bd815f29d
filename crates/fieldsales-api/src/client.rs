//! HTTP client for the remote document store.
//!
//! The store exposes two collections over REST:
//!
//! - `users/{uid}`: one document per user (`GET` / `PUT`)
//! - `reported`: the shared reported-item collection (`POST` to insert,
//!   `PUT reported/{id}` to overwrite, `GET` with optional
//!   `field`/`value`/`limit` query parameters to list or query)
//!
//! List responses have the shape `{"documents": [{"id": ..., ...fields}]}`.

use std::fmt;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{ReportedItem, ReportedRecord, UserRecord};
use crate::remote::{ReportedStore, UserStore};
use crate::retry::{send_with_retry, RetryConfig};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const USERS: &str = "users";
const REPORTED: &str = "reported";

#[derive(Deserialize)]
struct DocumentList<T> {
    #[serde(default = "Vec::new")]
    documents: Vec<T>,
}

#[derive(Deserialize)]
struct Created {
    id: String,
}

/// Client for the remote document store.
#[derive(Clone)]
pub struct StoreClient {
    token: String,
    http_client: reqwest::Client,
    base_url: String,
    retry: RetryConfig,
}

/// Builder for [`StoreClient`] with custom timeout and retry settings.
#[derive(Debug, Clone)]
pub struct StoreClientBuilder {
    token: String,
    base_url: String,
    timeout: Duration,
    retry: RetryConfig,
}

impl StoreClientBuilder {
    /// Starts a builder for the store at `base_url`.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryConfig::default(),
        }
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum number of retries on rate limiting.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.retry.max_retries = max_retries;
        self
    }

    /// Sets the initial backoff between retries.
    pub fn initial_backoff(mut self, backoff: Duration) -> Self {
        self.retry.initial_backoff = backoff;
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be created.
    pub fn build(self) -> Result<StoreClient> {
        let http_client = reqwest::Client::builder().timeout(self.timeout).build()?;
        Ok(StoreClient {
            token: self.token,
            http_client,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            retry: self.retry,
        })
    }
}

impl StoreClient {
    /// Creates a client with default timeout and retry settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be created.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        StoreClientBuilder::new(base_url, token).build()
    }

    /// Returns a builder for custom settings.
    pub fn builder(base_url: impl Into<String>, token: impl Into<String>) -> StoreClientBuilder {
        StoreClientBuilder::new(base_url, token)
    }

    /// Returns the API token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, collection: &str, id: &str) -> Result<T> {
        let url = self.url(path);
        tracing::debug!(%url, "GET");
        let response = send_with_retry(&self.retry, collection, id, || {
            self.http_client.get(&url).bearer_auth(&self.token).send()
        })
        .await?;
        Ok(response.json::<T>().await?)
    }

    async fn put_json<B: Serialize>(&self, path: &str, collection: &str, id: &str, body: &B) -> Result<()> {
        let url = self.url(path);
        let body = serde_json::to_value(body)?;
        tracing::debug!(%url, "PUT");
        send_with_retry(&self.retry, collection, id, || {
            self.http_client
                .put(&url)
                .bearer_auth(&self.token)
                .json(&body)
                .send()
        })
        .await?;
        Ok(())
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        collection: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.url(path);
        let body = serde_json::to_value(body)?;
        tracing::debug!(%url, "POST");
        let response = send_with_retry(&self.retry, collection, "", || {
            self.http_client
                .post(&url)
                .bearer_auth(&self.token)
                .json(&body)
                .send()
        })
        .await?;
        Ok(response.json::<T>().await?)
    }
}

impl UserStore for StoreClient {
    async fn load_user(&self, uid: &str) -> Result<Option<UserRecord>> {
        match self.get_json(&format!("{USERS}/{uid}"), USERS, uid).await {
            Ok(user) => Ok(Some(user)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn save_user(&self, user: &UserRecord) -> Result<()> {
        self.put_json(&format!("{USERS}/{}", user.uid), USERS, &user.uid, user)
            .await
    }
}

impl ReportedStore for StoreClient {
    async fn add_reported(&self, item: &ReportedItem) -> Result<String> {
        let created: Created = self.post_json(REPORTED, REPORTED, item).await?;
        Ok(created.id)
    }

    async fn update_reported(&self, id: &str, item: &ReportedItem) -> Result<()> {
        self.put_json(&format!("{REPORTED}/{id}"), REPORTED, id, item)
            .await
    }

    async fn find_reported(&self, field: &str, value: &str, limit: usize) -> Result<Vec<ReportedRecord>> {
        let limit = limit.to_string();
        let query = serde_urlencoded::to_string([
            ("field", field),
            ("value", value),
            ("limit", limit.as_str()),
        ])?;
        let list: DocumentList<ReportedRecord> = self
            .get_json(&format!("{REPORTED}?{query}"), REPORTED, "")
            .await?;
        Ok(list.documents)
    }

    async fn list_reported(&self) -> Result<Vec<ReportedRecord>> {
        let list: DocumentList<ReportedRecord> = self.get_json(REPORTED, REPORTED, "").await?;
        Ok(list.documents)
    }
}

impl fmt::Debug for StoreClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreClient")
            .field("token", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_client_stores_token_and_base_url() {
        let client = StoreClient::new("https://store.example.com/", "my-secret-token").unwrap();
        assert_eq!(client.token(), "my-secret-token");
        assert_eq!(client.base_url(), "https://store.example.com");
    }

    #[test]
    fn test_store_client_debug_redacts_token() {
        let client = StoreClient::new("https://store.example.com", "test-token").unwrap();
        let debug_str = format!("{:?}", client);
        assert!(
            !debug_str.contains("test-token"),
            "Token should be redacted in debug output"
        );
    }

    #[test]
    fn test_builder_overrides_retry_settings() {
        let client = StoreClient::builder("https://store.example.com", "t")
            .max_retries(0)
            .initial_backoff(Duration::from_millis(10))
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        assert_eq!(client.retry.max_retries, 0);
        assert_eq!(client.retry.initial_backoff, Duration::from_millis(10));
    }

    #[test]
    fn test_url_joins_path() {
        let client = StoreClient::new("https://store.example.com", "t").unwrap();
        assert_eq!(client.url("users/u1"), "https://store.example.com/users/u1");
    }
}
