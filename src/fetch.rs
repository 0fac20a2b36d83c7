use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::Value;

use crate::constants::{GEO_JSON, NWS_TIMEOUT_SECS, USER_AGENT};
use crate::error::UpstreamError;

/// Source of upstream JSON documents.
///
/// The weather tools only ever issue GETs, so this is the single seam between
/// them and the network.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GETs `url` and returns the decoded JSON body.
    ///
    /// A non-success status must surface as an [`UpstreamError`] inside the
    /// returned `anyhow::Error` so callers can tell a 404 apart.
    async fn get_json(&self, url: &str) -> Result<Value>;
}

/// [`Fetcher`] backed by a shared reqwest client
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static(GEO_JSON));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(NWS_TIMEOUT_SECS))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get_json(&self, url: &str) -> Result<Value> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError {
                url: url.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        let data = response.json::<Value>().await?;
        tracing::debug!(url, "upstream request succeeded");
        Ok(data)
    }
}
