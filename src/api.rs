mod client;

use std::error::Error as StdError;

use async_trait::async_trait;
use thiserror::Error;

pub use self::client::Client;

/// Network, timeout, or non-success status while fetching a resource.
#[derive(Debug, Error)]
#[error("failed to fetch `{url}`")]
pub struct TransportError {
    pub url: String,

    #[source]
    pub source: Box<dyn StdError + Send + Sync>,
}

impl TransportError {
    pub fn new(url: &str, source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self { url: url.to_owned(), source: source.into() }
    }
}

/// Source of the tariff tables and the Tempo calendar.
#[async_trait]
pub trait Fetch: Sync {
    /// Fetch the raw response body.
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, TransportError>;

    /// Fetch and parse a JSON response body.
    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value, TransportError>;
}
