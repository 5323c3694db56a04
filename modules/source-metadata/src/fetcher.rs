use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::MetadataConfig;
use crate::error::{MetadataError, Result};

/// Fetches the raw HTML of a cited page.
///
/// Implementations must report "no response at all" as
/// [`MetadataError::Transport`] and non-2xx responses as
/// [`MetadataError::Status`]; the resolver treats the two differently.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
    fn name(&self) -> &str;
}

/// reqwest-backed fetcher with a fixed client identifier and timeout.
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| MetadataError::Transport(format!("failed to build HTTP client: {e}")))?;

        info!(user_agent, timeout_secs = timeout.as_secs(), "HttpPageFetcher initialized");
        Ok(Self { client })
    }

    pub fn from_config(config: &MetadataConfig) -> Result<Self> {
        Self::new(&config.user_agent, config.request_timeout)
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        debug!(url, fetcher = "http", "Fetching page");

        let resp = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await
            .map_err(|e| MetadataError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(MetadataError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| MetadataError::Body(e.to_string()))?;

        debug!(url, fetcher = "http", bytes = body.len(), "Fetched successfully");
        Ok(body)
    }

    fn name(&self) -> &str {
        "http"
    }
}
