//! Shopping search API response types.
//!
//! Only the fields the rank tracker reads are modelled; everything else in
//! the response body is ignored by serde.

use serde::Deserialize;

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchPage {
    /// Total number of matches the engine reports for the query.
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub items: Vec<SearchItem>,
}

/// A single result entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchItem {
    /// The engine's identifier for the listed product.
    #[serde(rename = "productId")]
    pub external_id: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Error body returned alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(rename = "errorMessage")]
    pub error_message: Option<String>,
    #[serde(rename = "errorCode")]
    pub error_code: Option<String>,
}
