//! HTTP client for the shopping search API.
//!
//! Wraps `reqwest` with query construction, optional credential headers,
//! request pacing, and typed error mapping. Non-2xx statuses are surfaced
//! as [`SearchError`] variants whose [`FailureClass`](crate::FailureClass)
//! tells callers whether waiting can help. The client itself never retries.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::error::SearchError;
use crate::pacer::RequestPacer;
use crate::types::{ErrorBody, SearchPage};

const DEFAULT_BASE_URL: &str = "https://openapi.naver.com/";
const SEARCH_PATH: &str = "v1/search/shop.json";
const CLIENT_ID_HEADER: &str = "X-Naver-Client-Id";
const CLIENT_SECRET_HEADER: &str = "X-Naver-Client-Secret";

/// One page lookup against a search engine.
///
/// `start` is the 1-based absolute position of the first requested result
/// and `display` the page size.
#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(&self, query: &str, start: u32, display: u32)
        -> Result<SearchPage, SearchError>;
}

/// Client for the shopping search REST API.
pub struct ShoppingSearchClient {
    client: Client,
    base_url: Url,
    credentials: Option<(String, String)>,
    pacer: RequestPacer,
}

impl ShoppingSearchClient {
    /// Creates a client pointed at the production search API.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64, min_interval_ms: u64) -> Result<Self, SearchError> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout_secs, min_interval_ms)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`SearchError::InvalidBaseUrl`] if `base_url` does not
    /// parse.
    pub fn with_base_url(
        base_url: &str,
        timeout_secs: u64,
        min_interval_ms: u64,
    ) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("rankwatch/0.1 (rank-tracking)")
            .build()?;

        // Exactly one trailing slash so `join` appends instead of replacing
        // the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| SearchError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            credentials: None,
            pacer: RequestPacer::new(Duration::from_millis(min_interval_ms)),
        })
    }

    /// Attaches the static client id/secret headers sent with every request.
    #[must_use]
    pub fn with_credentials(mut self, client_id: &str, client_secret: &str) -> Self {
        self.credentials = Some((client_id.to_owned(), client_secret.to_owned()));
        self
    }

    fn build_url(&self, query: &str, start: u32, display: u32) -> Result<Url, SearchError> {
        let mut url = self
            .base_url
            .join(SEARCH_PATH)
            .map_err(|e| SearchError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("start", &start.to_string())
            .append_pair("display", &display.to_string());
        Ok(url)
    }

    /// Turns a non-2xx body into a readable message, preferring the API's
    /// own `errorMessage`/`errorCode` fields when present.
    fn error_message(body: &str) -> String {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(ErrorBody {
                error_message: Some(message),
                error_code: Some(code),
            }) => format!("[{code}] {message}"),
            Ok(ErrorBody {
                error_message: Some(message),
                ..
            }) => message,
            _ => body.chars().take(200).collect(),
        }
    }
}

#[async_trait]
impl SearchClient for ShoppingSearchClient {
    /// # Errors
    ///
    /// - [`SearchError::RateLimited`] on HTTP 429.
    /// - [`SearchError::ServerError`] on HTTP 5xx.
    /// - [`SearchError::Rejected`] on any other non-2xx status.
    /// - [`SearchError::Http`] on network failure.
    /// - [`SearchError::Deserialize`] if the body does not match [`SearchPage`].
    async fn search(
        &self,
        query: &str,
        start: u32,
        display: u32,
    ) -> Result<SearchPage, SearchError> {
        let url = self.build_url(query, start, display)?;

        self.pacer.wait().await;

        let mut request = self.client.get(url);
        if let Some((id, secret)) = &self.credentials {
            request = request
                .header(CLIENT_ID_HEADER, id)
                .header(CLIENT_SECRET_HEADER, secret);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), query, start, "search request failed");
            return Err(SearchError::from_status(
                status.as_u16(),
                Self::error_message(&body),
            ));
        }

        serde_json::from_str(&body).map_err(|e| SearchError::Deserialize {
            context: format!("search(query={query}, start={start})"),
            source: e,
        })
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
