//! Configuration types for pdb-dl

use crate::error::{Error, Result};
use crate::types::ExtractPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Microsoft's public symbol server
pub const DEFAULT_SYMBOL_SERVER: &str = "https://msdl.microsoft.com/download/symbols";

/// User agent the Microsoft symbol server expects from symbol clients
pub const DEFAULT_USER_AGENT: &str = "Microsoft-Symbol-Server/6.11.0001.402";

/// Backend used to transfer files from the symbol server
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchBackend {
    /// External `curl` binary
    #[default]
    Curl,
    /// In-process HTTP client
    Http,
}

/// Backend used to unpack cabinet archives
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractBackend {
    /// External `cabextract` (or `expand` on Windows)
    #[default]
    System,
    /// In-process cabinet decoder
    Builtin,
}

/// External tool paths
///
/// Grouped so it can be flattened into [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to curl executable (auto-detected if None)
    #[serde(default)]
    pub curl_path: Option<PathBuf>,

    /// Path to cabextract (or expand) executable (auto-detected if None)
    #[serde(default)]
    pub cabextract_path: Option<PathBuf>,

    /// Whether to search PATH for external binaries if explicit paths not set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            curl_path: None,
            cabextract_path: None,
            search_path: true,
        }
    }
}

/// Main configuration
///
/// Every field has a default, so an empty JSON object is a valid configuration file.
///
/// ```
/// use pdb_dl::Config;
///
/// let config: Config = serde_json::from_str(r#"{ "extract": "disabled" }"#).unwrap();
/// assert_eq!(config.symbol_server, pdb_dl::config::DEFAULT_SYMBOL_SERVER);
/// assert!(!config.extract.is_enabled());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the symbol server
    #[serde(default = "default_symbol_server")]
    pub symbol_server: String,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Whether downloaded cabinets are unpacked (default: enabled)
    #[serde(default)]
    pub extract: ExtractPolicy,

    /// Directory for downloaded files (default: the binary's directory, else ".")
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Transfer backend (default: curl)
    #[serde(default)]
    pub fetch_backend: FetchBackend,

    /// Extraction backend (default: system)
    #[serde(default)]
    pub extract_backend: ExtractBackend,

    /// External tool paths
    #[serde(flatten)]
    pub tools: ToolsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            symbol_server: default_symbol_server(),
            user_agent: default_user_agent(),
            extract: ExtractPolicy::default(),
            output_dir: None,
            fetch_backend: FetchBackend::default(),
            extract_backend: ExtractBackend::default(),
            tools: ToolsConfig::default(),
        }
    }
}

impl Config {
    /// Load a JSON configuration file
    ///
    /// Missing fields take their defaults. The result is validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the server and user agent are usable
    pub fn validate(&self) -> Result<()> {
        if self.symbol_server.trim().is_empty() {
            return Err(Error::MissingConfiguration {
                key: Some("symbol_server".to_string()),
            });
        }
        if self.user_agent.trim().is_empty() {
            return Err(Error::MissingConfiguration {
                key: Some("user_agent".to_string()),
            });
        }

        let url = url::Url::parse(&self.symbol_server).map_err(|e| Error::Config {
            message: format!("invalid symbol server URL {:?}: {}", self.symbol_server, e),
            key: Some("symbol_server".to_string()),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config {
                message: format!(
                    "symbol server must be an http or https URL, got scheme {:?}",
                    url.scheme()
                ),
                key: Some("symbol_server".to_string()),
            });
        }
        Ok(())
    }
}

fn default_symbol_server() -> String {
    DEFAULT_SYMBOL_SERVER.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_true() -> bool {
    true
}
