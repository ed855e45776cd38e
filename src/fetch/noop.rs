//! Fetcher used when no fetch tool is configured or found

use super::traits::Fetcher;
use async_trait::async_trait;
use std::path::Path;

/// Fetcher that is never available
///
/// Lets the downloader report a clean "tool unavailable" failure instead of failing to
/// construct when `curl` is missing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpFetcher;

#[async_trait]
impl Fetcher for NoOpFetcher {
    async fn is_available(&self) -> bool {
        false
    }

    async fn fetch(&self, _url: &str, _user_agent: &str, _destination: &Path) -> crate::Result<()> {
        Err(crate::Error::ToolUnavailable(
            "downloading requires curl. Configure curl_path in config, ensure curl is in PATH, \
             or use the http fetch backend."
                .into(),
        ))
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
