//! Symbol acquisition with compressed-first fallback
//!
//! [`PdbDownloader::run`] drives one acquisition:
//! 1. Validate - the debug file name must be non-empty
//! 2. Probe - without a usable fetch tool nothing is attempted
//! 3. Compressed - fetch `foo.pd_` and, if requested, unpack it (archive always removed
//!    after an extraction attempt)
//! 4. Raw fallback - fetch `foo.pdb` when the compressed path was skipped or failed
//!
//! Every step awaits its external process or transfer before the next one starts.

use crate::archive_name::{ArchiveIdentity, resource_url};
use crate::binary_info::DebugInfo;
use crate::config::{Config, ExtractBackend, FetchBackend};
use crate::error::{Error, Result};
use crate::extraction::{BuiltinCabExtractor, CabTool, CliCabExtractor, Extractor, NoOpExtractor};
use crate::fetch::{CurlFetcher, Fetcher, HttpFetcher, NoOpFetcher};
use crate::types::{AcquisitionResult, DownloadRequest, ExtractPolicy, ToolCapabilities};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

/// Downloads PDBs from a symbol server
///
/// Holds no per-download state; one instance can serve any number of sequential
/// [`run`](Self::run) calls.
///
/// # Examples
///
/// ```no_run
/// use pdb_dl::{Config, DownloadRequest, PdbDownloader};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::default();
/// let downloader = PdbDownloader::from_config(&config);
///
/// let request = DownloadRequest::new(
///     "ntdll.pdb",
///     "1EB9FACB04EA273BB4BA52C3D77EAC0C1",
///     &config.symbol_server,
///     &config.user_agent,
/// );
/// let result = downloader.run(&request).await?;
/// println!("succeeded: {}, file: {:?}", result.succeeded, result.local_path);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PdbDownloader {
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn Extractor>,
}

impl std::fmt::Debug for PdbDownloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdbDownloader")
            .field("fetcher", &self.fetcher.name())
            .field("extractor", &self.extractor.name())
            .finish()
    }
}

impl PdbDownloader {
    /// Create a downloader from explicit backends
    pub fn new(fetcher: Arc<dyn Fetcher>, extractor: Arc<dyn Extractor>) -> Self {
        Self { fetcher, extractor }
    }

    /// Create a downloader with the backends selected in `config`
    ///
    /// External tools are taken from their configured path, else looked up in PATH when
    /// `search_path` is set, else replaced by a no-op backend that reports itself as
    /// unavailable.
    pub fn from_config(config: &Config) -> Self {
        let fetcher: Arc<dyn Fetcher> = match config.fetch_backend {
            FetchBackend::Http => Arc::new(HttpFetcher::new()),
            FetchBackend::Curl => {
                if let Some(ref curl_path) = config.tools.curl_path {
                    Arc::new(CurlFetcher::new(curl_path.clone()))
                } else if config.tools.search_path {
                    CurlFetcher::from_path()
                        .map(|f| Arc::new(f) as Arc<dyn Fetcher>)
                        .unwrap_or_else(|| Arc::new(NoOpFetcher))
                } else {
                    Arc::new(NoOpFetcher)
                }
            }
        };

        let extractor: Arc<dyn Extractor> = match config.extract_backend {
            ExtractBackend::Builtin => Arc::new(BuiltinCabExtractor::new()),
            ExtractBackend::System => {
                let tool = CabTool::for_platform();
                if let Some(ref cab_path) = config.tools.cabextract_path {
                    Arc::new(CliCabExtractor::new(cab_path.clone(), tool))
                } else if config.tools.search_path {
                    CliCabExtractor::from_path(tool)
                        .map(|e| Arc::new(e) as Arc<dyn Extractor>)
                        .unwrap_or_else(|| Arc::new(NoOpExtractor))
                } else {
                    Arc::new(NoOpExtractor)
                }
            }
        };

        info!(
            fetcher = fetcher.name(),
            extractor = extractor.name(),
            "PDB downloader initialized"
        );
        Self::new(fetcher, extractor)
    }

    /// Probe both backends
    pub async fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities {
            fetch: self.fetcher.is_available().await,
            extract: self.extractor.is_available().await,
        }
    }

    /// Download the PDB described by `info` using `config`
    ///
    /// Both inputs are checked before anything is spawned or written: missing debug
    /// information fails with [`Error::MissingDebugFile`], missing or invalid
    /// configuration with [`Error::MissingConfiguration`] or [`Error::Config`].
    ///
    /// Files land in `config.output_dir`, else next to the binary, else in the current
    /// directory.
    pub async fn download_for_binary(
        &self,
        info: Option<&DebugInfo>,
        config: Option<&Config>,
    ) -> Result<AcquisitionResult> {
        let info = match info {
            Some(info) if !info.debug_file_name.is_empty() => info,
            _ => {
                error!("can't find debug filename");
                return Err(Error::MissingDebugFile);
            }
        };
        let config = config.ok_or_else(|| {
            error!("can't retrieve pdb configuration");
            Error::MissingConfiguration { key: None }
        })?;
        config.validate().inspect_err(|e| {
            error!(error = %e, "can't retrieve pdb configuration");
        })?;

        let target_directory = config
            .output_dir
            .clone()
            .or_else(|| info.binary_dir().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));

        let request = DownloadRequest::new(
            info.debug_file_name.as_str(),
            info.version_id.as_str(),
            config.symbol_server.as_str(),
            config.user_agent.as_str(),
        )
        .with_target_directory(target_directory)
        .with_extract_policy(config.extract);

        self.run(&request).await
    }

    /// Run one acquisition
    ///
    /// Returns `Err` only for an empty debug file name. Every other failure is logged and
    /// folded into an unsuccessful [`AcquisitionResult`].
    pub async fn run(&self, request: &DownloadRequest) -> Result<AcquisitionResult> {
        if request.debug_file_name().is_empty() {
            error!("can't find debug filename");
            return Err(Error::MissingDebugFile);
        }

        if !self.fetcher.is_available().await {
            warn!(
                fetcher = self.fetcher.name(),
                debug_file = request.debug_file_name(),
                "fetch tool unavailable, not downloading"
            );
            return Ok(AcquisitionResult::failure());
        }

        let identity = ArchiveIdentity::derive(request.debug_file_name())?;

        let try_compressed = match request.extract_policy() {
            ExtractPolicy::Disabled => true,
            ExtractPolicy::Enabled => self.extractor.is_available().await,
        };

        if try_compressed {
            match self.acquire_compressed(request, &identity).await {
                Ok(path) => {
                    info!(path = ?path, "PDB download success");
                    return Ok(AcquisitionResult::success(path));
                }
                Err(e) => {
                    warn!(error = %e, "compressed download failed");
                    info!("falling back to uncompressed pdb");
                }
            }
        } else {
            info!(
                extractor = self.extractor.name(),
                "extract tool unavailable, downloading uncompressed pdb"
            );
        }

        match self.acquire_raw(request, &identity).await {
            Ok(path) => {
                info!(path = ?path, "PDB download success");
                Ok(AcquisitionResult::success(path))
            }
            Err(e) => {
                warn!(error = %e, debug_file = request.debug_file_name(), "PDB download failed");
                Ok(AcquisitionResult::failure())
            }
        }
    }

    /// Fetch the cabinet and unpack it if requested
    ///
    /// Returns the deliverable: the extracted PDB, or the archive itself when extraction
    /// is disabled.
    async fn acquire_compressed(
        &self,
        request: &DownloadRequest,
        identity: &ArchiveIdentity,
    ) -> Result<PathBuf> {
        let archive_path = request.target_directory().join(&identity.compressed_name);
        self.fetch_archive(request, &identity.compressed_name, &archive_path)
            .await?;

        if !request.extract_policy().is_enabled() {
            return Ok(archive_path);
        }

        let extracted = self
            .extractor
            .extract(&archive_path, request.target_directory())
            .await;
        remove_archive(&archive_path).await;
        let extracted = extracted?;

        match select_deliverable(&extracted, &identity.raw_name) {
            Some(path) if matches!(tokio::fs::try_exists(path).await, Ok(true)) => {
                Ok(path.to_path_buf())
            }
            _ => {
                for path in &extracted {
                    remove_archive(path).await;
                }
                Err(Error::ExtractionFailed {
                    archive: archive_path,
                    reason: format!("archive did not contain {}", identity.raw_name),
                })
            }
        }
    }

    /// Fetch the uncompressed PDB
    async fn acquire_raw(
        &self,
        request: &DownloadRequest,
        identity: &ArchiveIdentity,
    ) -> Result<PathBuf> {
        let raw_path = request.target_directory().join(&identity.raw_name);
        self.fetch_archive(request, &identity.raw_name, &raw_path)
            .await?;
        Ok(raw_path)
    }

    async fn fetch_archive(
        &self,
        request: &DownloadRequest,
        archive_name: &str,
        destination: &Path,
    ) -> Result<()> {
        let url = resource_url(
            request.symbol_server(),
            request.debug_file_name(),
            request.version_id(),
            archive_name,
        );
        debug!(url = %url, ?destination, fetcher = self.fetcher.name(), "fetching");
        self.fetcher
            .fetch(&url, request.user_agent(), destination)
            .await
    }
}

/// Pick the extracted PDB: an exact name match, else a match ignoring case, else the
/// only file in the archive
fn select_deliverable<'a>(extracted: &'a [PathBuf], raw_name: &str) -> Option<&'a Path> {
    fn file_name(path: &Path) -> Option<&str> {
        path.file_name().and_then(|n| n.to_str())
    }

    extracted
        .iter()
        .find(|path| file_name(path) == Some(raw_name))
        .or_else(|| {
            extracted
                .iter()
                .find(|path| file_name(path).is_some_and(|n| n.eq_ignore_ascii_case(raw_name)))
        })
        .or(match extracted {
            [only] => Some(only),
            _ => None,
        })
        .map(PathBuf::as_path)
}

/// Delete a downloaded cabinet, or a stray extracted file, after an extraction attempt
async fn remove_archive(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(?path, error = %e, "failed to remove file");
        }
    }
}
