//! Archive naming and resource addressing on the symbol server
//!
//! A symbol server stores `foo.pdb` either uncompressed under its own name or as a cabinet
//! whose name has the last character replaced by an underscore (`foo.pd_`).

use crate::error::{Error, Result};

/// Final character of a compressed archive name
const COMPRESSED_SUFFIX: char = '_';

/// Final character of an uncompressed debug file name
const RAW_SUFFIX: char = 'b';

/// The two names a debug file can be stored under
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveIdentity {
    /// Cabinet archive name (`foo.pd_`)
    pub compressed_name: String,
    /// Uncompressed name (`foo.pdb`)
    pub raw_name: String,
}

impl ArchiveIdentity {
    /// Derive both archive names from a debug file name
    ///
    /// ```
    /// use pdb_dl::ArchiveIdentity;
    ///
    /// let identity = ArchiveIdentity::derive("kernel32.pdb").unwrap();
    /// assert_eq!(identity.compressed_name, "kernel32.pd_");
    /// assert_eq!(identity.raw_name, "kernel32.pdb");
    /// ```
    pub fn derive(debug_file_name: &str) -> Result<Self> {
        Ok(Self {
            compressed_name: compressed_name(debug_file_name)?,
            raw_name: raw_name(debug_file_name)?,
        })
    }
}

/// Name of the cabinet archive for `debug_file_name`
pub fn compressed_name(debug_file_name: &str) -> Result<String> {
    replace_last_char(debug_file_name, COMPRESSED_SUFFIX)
}

/// Name of the uncompressed file for `debug_file_name`
///
/// Also maps a compressed archive name back to the file it contains.
pub fn raw_name(debug_file_name: &str) -> Result<String> {
    replace_last_char(debug_file_name, RAW_SUFFIX)
}

fn replace_last_char(name: &str, replacement: char) -> Result<String> {
    let (idx, _) = name
        .char_indices()
        .next_back()
        .ok_or_else(|| Error::InvalidName(name.to_string()))?;
    let mut derived = String::with_capacity(idx + replacement.len_utf8());
    derived.push_str(&name[..idx]);
    derived.push(replacement);
    Ok(derived)
}

/// URL of `archive_name` for the given debug file and version on the symbol server
///
/// ```
/// use pdb_dl::archive_name::resource_url;
///
/// let url = resource_url("https://msdl.microsoft.com/download/symbols/", "a.pdb", "ABC1", "a.pd_");
/// assert_eq!(url, "https://msdl.microsoft.com/download/symbols/a.pdb/ABC1/a.pd_");
/// ```
pub fn resource_url(
    symbol_server: &str,
    debug_file_name: &str,
    version_id: &str,
    archive_name: &str,
) -> String {
    format!(
        "{}/{}/{}/{}",
        symbol_server.trim_end_matches('/'),
        debug_file_name,
        version_id,
        archive_name
    )
}
