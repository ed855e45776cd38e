//! Fetcher trait

use async_trait::async_trait;
use std::path::Path;

/// A backend that downloads one resource from a symbol server into a local file
///
/// `fetch` blocks the calling task until the transfer finished. No timeout is applied on
/// top of whatever the backend uses by default, so a stalled server stalls the caller.
///
/// # Examples
///
/// ```no_run
/// use pdb_dl::fetch::{CurlFetcher, Fetcher};
/// use std::path::Path;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let fetcher = CurlFetcher::from_path().expect("curl not found");
/// if fetcher.is_available().await {
///     fetcher
///         .fetch(
///             "https://msdl.microsoft.com/download/symbols/ntdll.pdb/1EB9FACB04EA273BB4BA52C3D77EAC0C1/ntdll.pd_",
///             "Microsoft-Symbol-Server/6.11.0001.402",
///             Path::new("ntdll.pd_"),
///         )
///         .await?;
/// }
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Whether the backend can perform transfers at all
    ///
    /// Never fails: a missing or broken tool simply reports `false`.
    async fn is_available(&self) -> bool;

    /// Download `url` into `destination`, sending `user_agent`
    ///
    /// On failure the destination file does not exist afterwards.
    async fn fetch(&self, url: &str, user_agent: &str, destination: &Path) -> crate::Result<()>;

    /// Short backend name for logs
    fn name(&self) -> &'static str;
}
