use thiserror::Error;

/// How a failed search call should be treated by callers that retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// HTTP 429; back off exponentially.
    RateLimited,
    /// HTTP 5xx; back off linearly.
    ServerError,
    /// Anything waiting cannot fix: auth, bad input, other 4xx, malformed
    /// responses, transport failures without a status.
    Permanent,
}

/// Errors returned by the shopping search client.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by search API (HTTP 429)")]
    RateLimited,

    #[error("search API server error (HTTP {status}): {message}")]
    ServerError { status: u16, message: String },

    /// Non-retriable 4xx status, e.g. invalid credentials or a malformed query.
    #[error("search API rejected request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// Request parameters that can never produce a search call.
    #[error("invalid search request: {reason}")]
    InvalidRequest { reason: String },
}

impl SearchError {
    /// Maps a non-success HTTP status to the matching error variant.
    #[must_use]
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            429 => SearchError::RateLimited,
            s if s >= 500 => SearchError::ServerError { status, message },
            _ => SearchError::Rejected { status, message },
        }
    }

    #[must_use]
    pub fn class(&self) -> FailureClass {
        match self {
            SearchError::RateLimited => FailureClass::RateLimited,
            SearchError::ServerError { .. } => FailureClass::ServerError,
            SearchError::Http(_)
            | SearchError::Rejected { .. }
            | SearchError::Deserialize { .. }
            | SearchError::InvalidBaseUrl { .. }
            | SearchError::InvalidRequest { .. } => FailureClass::Permanent,
        }
    }

    /// Short stable code stored alongside the message in the error log.
    #[must_use]
    pub fn error_code(&self) -> String {
        match self {
            SearchError::RateLimited => "429".to_owned(),
            SearchError::ServerError { status, .. } | SearchError::Rejected { status, .. } => {
                status.to_string()
            }
            SearchError::Http(_) => "NETWORK".to_owned(),
            SearchError::Deserialize { .. } => "DESERIALIZE".to_owned(),
            SearchError::InvalidBaseUrl { .. } | SearchError::InvalidRequest { .. } => {
                "CONFIG".to_owned()
            }
        }
    }
}
