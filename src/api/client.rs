use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, redirect::Policy};

use crate::{
    api::{Fetch, TransportError},
    prelude::*,
};

/// HTTP client for the public endpoints.
///
/// data.gouv.fr rejects requests without a user agent.
pub struct Client(reqwest::Client);

impl Client {
    const TIMEOUT: Duration = Duration::from_secs(30);
    const USER_AGENT: &str = concat!("tarif-edf/", env!("CARGO_PKG_VERSION"));

    pub fn try_new() -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(Self::TIMEOUT)
            .user_agent(Self::USER_AGENT)
            .redirect(Policy::limited(10))
            .build()?;
        Ok(Self(inner))
    }

    async fn get(&self, url: &str) -> Result<Response, TransportError> {
        self.0
            .get(url)
            .send()
            .await
            .and_then(Response::error_for_status)
            .map_err(|error| TransportError::new(url, error))
    }
}

#[async_trait]
impl Fetch for Client {
    #[instrument(skip(self))]
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        debug!("fetching…");
        let body =
            self.get(url).await?.bytes().await.map_err(|error| TransportError::new(url, error))?;
        debug!(len = body.len(), "fetched");
        Ok(body.to_vec())
    }

    #[instrument(skip(self))]
    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value, TransportError> {
        debug!("fetching…");
        self.get(url).await?.json().await.map_err(|error| TransportError::new(url, error))
    }
}
