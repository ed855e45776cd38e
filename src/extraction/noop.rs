//! Extractor used when no cabinet tool is available

use super::traits::Extractor;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Extractor that is never available
///
/// With extraction enabled the downloader skips straight to the uncompressed file when
/// this extractor is installed.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpExtractor;

#[async_trait]
impl Extractor for NoOpExtractor {
    async fn is_available(&self) -> bool {
        false
    }

    async fn extract(
        &self,
        _archive: &Path,
        _destination_dir: &Path,
    ) -> crate::Result<Vec<PathBuf>> {
        Err(crate::Error::ToolUnavailable(
            "cabinet extraction requires cabextract. Configure cabextract_path in config, \
             ensure cabextract is in PATH, or use the builtin extract backend."
                .into(),
        ))
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
