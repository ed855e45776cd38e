//! In-process HTTP fetcher

use super::discard_partial;
use super::traits::Fetcher;
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Fetcher that performs the GET with `reqwest`
///
/// Needs no external binary and is therefore always available. Redirects are followed
/// with reqwest's default policy; no request timeout is configured.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with a default client
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fetcher that reuses an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn download(&self, url: &str, user_agent: &str, destination: &Path) -> crate::Result<u64> {
        let mut response = self
            .client
            .get(url)
            .header(USER_AGENT, user_agent)
            .send()
            .await?
            .error_for_status()?;

        let mut file = tokio::fs::File::create(destination).await?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok(written)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn is_available(&self) -> bool {
        true
    }

    async fn fetch(&self, url: &str, user_agent: &str, destination: &Path) -> crate::Result<()> {
        match self.download(url, user_agent, destination).await {
            Ok(bytes) => {
                debug!(url, ?destination, bytes, "download complete");
                Ok(())
            }
            Err(e) => {
                discard_partial(destination).await;
                Err(crate::Error::FetchFailed {
                    url: url.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
