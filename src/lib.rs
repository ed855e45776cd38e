//! # pdb-dl
//!
//! Downloads PDB debug symbols from a Microsoft-style symbol server.
//!
//! A symbol server stores each PDB under `<server>/<name>/<guid+age>/`, either as a
//! cabinet archive (`name.pd_`) or uncompressed (`name.pdb`). [`PdbDownloader`] tries the
//! cabinet first when it can be unpacked, and falls back to the uncompressed file
//! otherwise.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdb_dl::{Config, DebugInfo, PdbDownloader};
//! use pdb_dl::output::{OutputFormat, Report};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let info = DebugInfo::from_pe_file(Path::new("app.exe"))?;
//!
//!     let downloader = PdbDownloader::from_config(&config);
//!     let result = downloader.download_for_binary(Some(&info), Some(&config)).await?;
//!
//!     let mut report = Report::new(OutputFormat::Human);
//!     print!("{}", report.render(&info.debug_file_name, result.succeeded)?);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Archive naming and symbol server addressing
pub mod archive_name;
/// Debug file identity read from PE binaries
pub mod binary_info;
/// Configuration types
pub mod config;
/// Symbol acquisition with compressed-first fallback
pub mod downloader;
/// Error types
pub mod error;
/// Cabinet extraction backends
pub mod extraction;
/// Transfer backends
pub mod fetch;
/// Report rendering
pub mod output;
/// External tool capability checks
pub mod probe;
/// Core request and result types
pub mod types;

// Re-export commonly used types
pub use archive_name::ArchiveIdentity;
pub use binary_info::DebugInfo;
pub use config::Config;
pub use downloader::PdbDownloader;
pub use error::{Error, Result};
pub use extraction::{BuiltinCabExtractor, CliCabExtractor, Extractor, NoOpExtractor};
pub use fetch::{CurlFetcher, Fetcher, HttpFetcher, NoOpFetcher};
pub use types::{AcquisitionResult, DownloadRequest, ExtractPolicy, ToolCapabilities};
