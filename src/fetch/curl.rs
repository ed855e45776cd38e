//! Fetcher backed by the external curl binary

use super::discard_partial;
use super::traits::Fetcher;
use crate::probe::probe_tool;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Fetcher that runs `curl`
///
/// The command is built as an argument vector, so URLs, paths and the user agent are never
/// interpreted by a shell. Equivalent to
/// `curl -s -f -L -A <user agent> --url <url> -o <destination>`.
///
/// # Examples
///
/// ```no_run
/// use pdb_dl::fetch::{CurlFetcher, Fetcher};
/// use std::path::PathBuf;
///
/// // Create with explicit path
/// let fetcher = CurlFetcher::new(PathBuf::from("/usr/bin/curl"));
///
/// // Or auto-discover from PATH
/// let fetcher = CurlFetcher::from_path().expect("curl not found in PATH");
/// assert_eq!(fetcher.name(), "curl");
/// ```
#[derive(Debug, Clone)]
pub struct CurlFetcher {
    binary_path: PathBuf,
}

impl CurlFetcher {
    /// Create a fetcher with an explicit curl binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find curl in PATH
    ///
    /// Returns `None` when `which` cannot locate the binary.
    pub fn from_path() -> Option<Self> {
        which::which("curl").ok().map(Self::new)
    }

    /// Path of the curl binary this fetcher runs
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    fn command(&self, url: &str, user_agent: &str, destination: &Path) -> Command {
        let mut cmd = Command::new(&self.binary_path);
        cmd.arg("-s") // silent
            .arg("-f") // fail on HTTP errors
            .arg("-L") // follow CDN redirects
            .arg("-A")
            .arg(user_agent)
            .arg("--url")
            .arg(url)
            .arg("-o")
            .arg(destination)
            .stdin(Stdio::null());
        cmd
    }
}

#[async_trait]
impl Fetcher for CurlFetcher {
    async fn is_available(&self) -> bool {
        probe_tool(&self.binary_path, &["--version"]).await
    }

    async fn fetch(&self, url: &str, user_agent: &str, destination: &Path) -> crate::Result<()> {
        debug!(url, ?destination, "running curl");

        let mut cmd = self.command(url, user_agent, destination);
        let status = cmd
            .status()
            .await
            .map_err(|e| crate::Error::ExternalTool(format!("Failed to execute curl: {}", e)))?;

        if status.success() {
            return Ok(());
        }

        discard_partial(destination).await;
        Err(crate::Error::FetchFailed {
            url: url.to_string(),
            reason: match status.code() {
                Some(code) => format!("curl exited with error {}", code),
                None => "curl was terminated by a signal".to_string(),
            },
        })
    }

    fn name(&self) -> &'static str {
        "curl"
    }
}
