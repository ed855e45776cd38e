//! Extractor backed by an external cabinet tool

use super::traits::Extractor;
use crate::archive_name::raw_name;
use crate::probe::probe_tool;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// External cabinet tools understood by [`CliCabExtractor`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CabTool {
    /// `cabextract -d <dir> <archive>`
    Cabextract,
    /// Windows `expand <archive> <file>`
    Expand,
}

impl CabTool {
    /// The tool conventionally available on the current platform
    pub fn for_platform() -> Self {
        if cfg!(windows) {
            CabTool::Expand
        } else {
            CabTool::Cabextract
        }
    }

    /// Program name looked up in PATH
    pub fn program(self) -> &'static str {
        match self {
            CabTool::Cabextract => "cabextract",
            CabTool::Expand => "expand",
        }
    }

    fn probe_args(self) -> &'static [&'static str] {
        match self {
            CabTool::Cabextract => &["-v"],
            CabTool::Expand => &["-?"],
        }
    }
}

/// Extractor that runs `cabextract` or `expand`
///
/// # Examples
///
/// ```no_run
/// use pdb_dl::extraction::{CabTool, CliCabExtractor, Extractor};
/// use std::path::Path;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let extractor = CliCabExtractor::from_path(CabTool::for_platform())
///     .expect("cabextract not found in PATH");
/// extractor.extract(Path::new("ntdll.pd_"), Path::new(".")).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CliCabExtractor {
    binary_path: PathBuf,
    tool: CabTool,
}

impl CliCabExtractor {
    /// Create an extractor with an explicit binary path
    pub fn new(binary_path: PathBuf, tool: CabTool) -> Self {
        Self { binary_path, tool }
    }

    /// Attempt to find the tool in PATH
    pub fn from_path(tool: CabTool) -> Option<Self> {
        which::which(tool.program())
            .ok()
            .map(|path| Self::new(path, tool))
    }

    /// Path of the binary this extractor runs
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// Which tool's command line this extractor speaks
    pub fn tool(&self) -> CabTool {
        self.tool
    }

    fn command(&self, archive: &Path, destination_dir: &Path) -> crate::Result<Command> {
        let mut cmd = Command::new(&self.binary_path);
        match self.tool {
            CabTool::Cabextract => {
                cmd.arg("-d").arg(destination_dir).arg(archive);
            }
            CabTool::Expand => {
                // expand wants the output file, not a directory
                cmd.arg(archive)
                    .arg(destination_dir.join(expected_pdb_name(archive)?));
            }
        }
        cmd.stdin(Stdio::null()).stdout(Stdio::null());
        Ok(cmd)
    }
}

/// Uncompressed name of the PDB stored in `archive`
fn expected_pdb_name(archive: &Path) -> crate::Result<String> {
    let archive_name = archive
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| crate::Error::ExtractionFailed {
            archive: archive.to_path_buf(),
            reason: "archive path has no UTF-8 file name".to_string(),
        })?;
    raw_name(archive_name)
}

/// Regular files in `dir` named `wanted`, ignoring ASCII case
async fn find_extracted(dir: &Path, wanted: &str) -> std::io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let matches = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.eq_ignore_ascii_case(wanted));
        if matches && entry.file_type().await?.is_file() {
            found.push(entry.path());
        }
    }
    found.sort();
    Ok(found)
}

#[async_trait]
impl Extractor for CliCabExtractor {
    async fn is_available(&self) -> bool {
        probe_tool(&self.binary_path, self.tool.probe_args()).await
    }

    async fn extract(
        &self,
        archive: &Path,
        destination_dir: &Path,
    ) -> crate::Result<Vec<PathBuf>> {
        debug!(?archive, ?destination_dir, tool = self.tool.program(), "running cab extractor");

        let expected = expected_pdb_name(archive)?;
        let mut cmd = self.command(archive, destination_dir)?;
        let output = cmd
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                crate::Error::ExternalTool(format!(
                    "Failed to execute {}: {}",
                    self.tool.program(),
                    e
                ))
            })?;

        if output.status.success() {
            // The tool writes names as stored in the cabinet, whose case may differ
            return find_extracted(destination_dir, &expected)
                .await
                .map_err(|e| crate::Error::ExtractionFailed {
                    archive: archive.to_path_buf(),
                    reason: format!("cannot list extracted files: {}", e),
                });
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(crate::Error::ExtractionFailed {
            archive: archive.to_path_buf(),
            reason: format!(
                "{} exited with error {}: {}",
                self.tool.program(),
                output
                    .status
                    .code()
                    .map_or_else(|| "signal".to_string(), |c| c.to_string()),
                stderr.trim()
            ),
        })
    }

    fn name(&self) -> &'static str {
        self.tool.program()
    }
}
