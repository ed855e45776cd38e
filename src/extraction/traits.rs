//! Extractor trait

use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// A backend that unpacks a cabinet archive into a directory
///
/// Implementations leave the archive in place. Deleting it is up to the caller.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Whether the backend can extract at all
    ///
    /// Never fails: a missing or broken tool simply reports `false`.
    async fn is_available(&self) -> bool;

    /// Unpack `archive` into `destination_dir`
    ///
    /// Returns the files left in `destination_dir`. Backends that cannot list what an
    /// external tool wrote return the files matching the archive's expected PDB name.
    async fn extract(&self, archive: &Path, destination_dir: &Path)
    -> crate::Result<Vec<PathBuf>>;

    /// Short backend name for logs
    fn name(&self) -> &'static str;
}
