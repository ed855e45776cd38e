//! Transfer of symbol files from a symbol server
//!
//! Every backend implements [`Fetcher`]. [`CurlFetcher`] shells out to `curl` with an
//! argument vector, [`HttpFetcher`] performs the request in-process, and [`NoOpFetcher`]
//! stands in when no fetch tool could be found.

mod curl;
mod http;
mod noop;
mod traits;

pub use curl::CurlFetcher;
pub use http::HttpFetcher;
pub use noop::NoOpFetcher;
pub use traits::Fetcher;

use std::path::Path;
use tracing::warn;

/// Remove a destination left behind by a failed transfer
pub(crate) async fn discard_partial(destination: &Path) {
    match tokio::fs::remove_file(destination).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            warn!(?destination, error = %e, "failed to remove partial download");
        }
    }
}
