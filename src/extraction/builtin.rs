//! In-process cabinet extraction with the `cab` crate

use super::traits::Extractor;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tokio::task::spawn_blocking;
use tracing::{debug, info};

/// Extractor that reads the cabinet itself
///
/// Needs no external tool and is therefore always available. Every file stored in the
/// cabinet is written into the destination directory under its bare file name; directory
/// components inside the cabinet are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinCabExtractor;

impl BuiltinCabExtractor {
    /// Create a builtin extractor
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Extractor for BuiltinCabExtractor {
    async fn is_available(&self) -> bool {
        true
    }

    async fn extract(&self, archive: &Path, destination_dir: &Path) -> Result<Vec<PathBuf>> {
        // Decompression is CPU-bound, keep it off the async workers
        let archive_owned = archive.to_path_buf();
        let dest_owned = destination_dir.to_path_buf();
        let files = spawn_blocking(move || extract_cabinet(&archive_owned, &dest_owned))
            .await
            .map_err(|e| Error::ExtractionFailed {
                archive: archive.to_path_buf(),
                reason: format!("extraction task panicked: {}", e),
            })??;

        info!(?archive, extracted = files.len(), "cabinet extracted");
        Ok(files)
    }

    fn name(&self) -> &'static str {
        "builtin-cab"
    }
}

fn extract_cabinet(archive: &Path, destination_dir: &Path) -> Result<Vec<PathBuf>> {
    let failed = |reason: String| Error::ExtractionFailed {
        archive: archive.to_path_buf(),
        reason,
    };

    let file = File::open(archive).map_err(|e| failed(format!("cannot open archive: {}", e)))?;
    let mut cabinet =
        cab::Cabinet::new(file).map_err(|e| failed(format!("not a cabinet archive: {}", e)))?;

    let names: Vec<String> = cabinet
        .folder_entries()
        .flat_map(|folder| folder.file_entries())
        .map(|entry| entry.name().to_string())
        .collect();
    if names.is_empty() {
        return Err(failed("archive contains no files".to_string()));
    }

    let mut extracted = Vec::with_capacity(names.len());
    for name in names {
        let target = destination_dir.join(entry_file_name(&name).ok_or_else(|| {
            failed(format!("archive entry {:?} has no usable file name", name))
        })?);
        debug!(entry = %name, ?target, "extracting cabinet entry");

        let mut reader = cabinet
            .read_file(&name)
            .map_err(|e| failed(format!("cannot read entry {}: {}", name, e)))?;
        let output = File::create(&target)
            .map_err(|e| failed(format!("cannot create {}: {}", target.display(), e)))?;
        let mut writer = BufWriter::new(output);
        std::io::copy(&mut reader, &mut writer)
            .and_then(|_| writer.flush())
            .map_err(|e| failed(format!("cannot decompress entry {}: {}", name, e)))?;
        extracted.push(target);
    }
    Ok(extracted)
}

/// Last component of a cabinet entry name, which may use `\` separators
fn entry_file_name(name: &str) -> Option<&str> {
    name.rsplit(['/', '\\'])
        .next()
        .filter(|n| !n.is_empty() && *n != "." && *n != "..")
}
