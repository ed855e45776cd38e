//! Core request and result types

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Whether a downloaded cabinet archive should be unpacked
///
/// With [`ExtractPolicy::Disabled`] the compressed archive itself is the deliverable and the
/// extraction tool is never consulted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractPolicy {
    /// Keep the compressed archive as downloaded
    Disabled,
    /// Unpack the archive and delete it afterwards
    #[default]
    Enabled,
}

impl ExtractPolicy {
    /// Map a legacy integer extract flag onto a policy
    ///
    /// Positive values enable extraction. Zero and negative values disable it.
    ///
    /// ```
    /// use pdb_dl::ExtractPolicy;
    ///
    /// assert_eq!(ExtractPolicy::from_flag(1), ExtractPolicy::Enabled);
    /// assert_eq!(ExtractPolicy::from_flag(0), ExtractPolicy::Disabled);
    /// assert_eq!(ExtractPolicy::from_flag(-1), ExtractPolicy::Disabled);
    /// ```
    pub fn from_flag(flag: i64) -> Self {
        if flag > 0 {
            ExtractPolicy::Enabled
        } else {
            ExtractPolicy::Disabled
        }
    }

    /// Whether extraction is requested
    pub fn is_enabled(self) -> bool {
        self == ExtractPolicy::Enabled
    }
}

/// A single symbol acquisition
///
/// Built once by the caller and only read afterwards. The target directory defaults to
/// the current directory and extraction defaults to enabled.
///
/// ```
/// use pdb_dl::{DownloadRequest, ExtractPolicy};
///
/// let request = DownloadRequest::new(
///     "ntdll.pdb",
///     "1EB9FACB04EA273BB4BA52C3D77EAC0C1",
///     "https://msdl.microsoft.com/download/symbols",
///     "Microsoft-Symbol-Server/6.11.0001.402",
/// )
/// .with_target_directory("/tmp/symbols")
/// .with_extract_policy(ExtractPolicy::Disabled);
///
/// assert_eq!(request.debug_file_name(), "ntdll.pdb");
/// assert!(!request.extract_policy().is_enabled());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadRequest {
    debug_file_name: String,
    version_id: String,
    symbol_server: String,
    user_agent: String,
    target_directory: PathBuf,
    extract_policy: ExtractPolicy,
}

impl DownloadRequest {
    /// Create a request with the default target directory and extraction enabled
    pub fn new(
        debug_file_name: impl Into<String>,
        version_id: impl Into<String>,
        symbol_server: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            debug_file_name: debug_file_name.into(),
            version_id: version_id.into(),
            symbol_server: symbol_server.into(),
            user_agent: user_agent.into(),
            target_directory: PathBuf::from("."),
            extract_policy: ExtractPolicy::default(),
        }
    }

    /// Set the directory the symbol file is written to
    pub fn with_target_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.target_directory = dir.into();
        self
    }

    /// Set whether the compressed archive is unpacked
    pub fn with_extract_policy(mut self, policy: ExtractPolicy) -> Self {
        self.extract_policy = policy;
        self
    }

    /// Debug file name embedded in the binary (e.g. `ntdll.pdb`)
    pub fn debug_file_name(&self) -> &str {
        &self.debug_file_name
    }

    /// Symbol server key for this build (GUID followed by age)
    pub fn version_id(&self) -> &str {
        &self.version_id
    }

    /// Base URL of the symbol server
    pub fn symbol_server(&self) -> &str {
        &self.symbol_server
    }

    /// User agent sent with every request
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Directory that receives the archive and the symbol file
    pub fn target_directory(&self) -> &Path {
        &self.target_directory
    }

    /// Extraction policy
    pub fn extract_policy(&self) -> ExtractPolicy {
        self.extract_policy
    }
}

/// Outcome of one acquisition
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcquisitionResult {
    /// Whether a usable file was left on disk
    pub succeeded: bool,
    /// The deliverable: the extracted symbol file, the kept archive or the raw download
    pub local_path: Option<PathBuf>,
}

impl AcquisitionResult {
    /// A successful acquisition of `path`
    pub fn success(path: PathBuf) -> Self {
        Self {
            succeeded: true,
            local_path: Some(path),
        }
    }

    /// A failed acquisition
    pub fn failure() -> Self {
        Self {
            succeeded: false,
            local_path: None,
        }
    }
}

/// Availability of the external tools used by a downloader
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ToolCapabilities {
    /// A fetch tool is present and usable
    pub fetch: bool,
    /// An extraction tool is present and usable
    pub extract: bool,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request = DownloadRequest::new("a.pdb", "ABC1", "https://srv", "ua");
        assert_eq!(request.target_directory(), Path::new("."));
        assert_eq!(request.extract_policy(), ExtractPolicy::Enabled);
        assert_eq!(request.version_id(), "ABC1");
        assert_eq!(request.symbol_server(), "https://srv");
        assert_eq!(request.user_agent(), "ua");
    }

    #[test]
    fn test_extract_policy_negative_flag_is_disabled() {
        assert_eq!(ExtractPolicy::from_flag(-7), ExtractPolicy::Disabled);
        assert_eq!(ExtractPolicy::from_flag(2), ExtractPolicy::Enabled);
        assert_eq!(ExtractPolicy::from_flag(0), ExtractPolicy::Disabled);
    }

    #[test]
    fn test_capabilities_json() {
        let caps = ToolCapabilities {
            fetch: true,
            extract: false,
        };
        assert_eq!(
            serde_json::to_string(&caps).unwrap(),
            r#"{"fetch":true,"extract":false}"#
        );
    }

    #[test]
    fn test_extract_policy_serde() {
        let policy: ExtractPolicy = serde_json::from_str("\"disabled\"").unwrap();
        assert_eq!(policy, ExtractPolicy::Disabled);
        assert_eq!(
            serde_json::to_string(&ExtractPolicy::Enabled).unwrap(),
            "\"enabled\""
        );
    }

    #[test]
    fn test_acquisition_result_constructors() {
        let ok = AcquisitionResult::success(PathBuf::from("x.pdb"));
        assert!(ok.succeeded);
        assert_eq!(ok.local_path.as_deref(), Some(Path::new("x.pdb")));

        let failed = AcquisitionResult::failure();
        assert!(!failed.succeeded);
        assert!(failed.local_path.is_none());
    }
}
