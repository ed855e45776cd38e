//! Debug file identity embedded in a PE binary
//!
//! The CodeView record of a PE image names the PDB it was linked with and carries the
//! GUID and age that key it on a symbol server.

use crate::error::{Error, Result};
use object::Object;
use std::path::{Path, PathBuf};

/// Debug file name and symbol server key of one binary
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DebugInfo {
    /// PDB file name without directories (e.g. `ntdll.pdb`)
    pub debug_file_name: String,
    /// GUID and age as used in symbol server paths
    pub version_id: String,
    /// Path of the binary the information came from
    pub binary_path: Option<PathBuf>,
}

impl DebugInfo {
    /// Build debug info from already known values
    pub fn new(debug_file_name: impl Into<String>, version_id: impl Into<String>) -> Self {
        Self {
            debug_file_name: debug_file_name.into(),
            version_id: version_id.into(),
            binary_path: None,
        }
    }

    /// Read the CodeView record of the PE file at `path`
    pub fn from_pe_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)
            .map_err(|e| Error::BinaryInfo(format!("cannot read {}: {}", path.display(), e)))?;
        let mut info = Self::from_pe_bytes(&data)?;
        info.binary_path = Some(path.to_path_buf());
        Ok(info)
    }

    /// Read the CodeView record of an in-memory PE image
    ///
    /// Fails with [`Error::MissingDebugFile`] when the image has no CodeView record.
    pub fn from_pe_bytes(data: &[u8]) -> Result<Self> {
        let file = object::File::parse(data)
            .map_err(|e| Error::BinaryInfo(format!("cannot parse binary: {}", e)))?;
        let codeview = file
            .pdb_info()
            .map_err(|e| Error::BinaryInfo(format!("malformed debug directory: {}", e)))?
            .ok_or(Error::MissingDebugFile)?;

        let pdb_path = std::str::from_utf8(codeview.path())
            .map_err(|_| Error::BinaryInfo("PDB path is not valid UTF-8".to_string()))?;
        let debug_file_name = pdb_file_name(pdb_path);
        if debug_file_name.is_empty() {
            return Err(Error::MissingDebugFile);
        }

        Ok(Self {
            debug_file_name: debug_file_name.to_string(),
            version_id: format_version_id(codeview.guid(), codeview.age()),
            binary_path: None,
        })
    }

    /// Directory containing the binary, if known
    pub fn binary_dir(&self) -> Option<&Path> {
        self.binary_path
            .as_deref()
            .and_then(Path::parent)
            .filter(|p| !p.as_os_str().is_empty())
    }
}

/// Final component of a PDB path recorded by either a Windows or a Unix linker
fn pdb_file_name(pdb_path: &str) -> &str {
    match pdb_path.rsplit_once(['/', '\\']) {
        Some((_dir, file_name)) => file_name,
        None => pdb_path,
    }
}

/// Symbol server key: GUID fields in big-endian hex, then the age in hex
///
/// The GUID's first three fields are stored little-endian in the image.
fn format_version_id(guid: [u8; 16], age: u32) -> String {
    let data1 = u32::from_le_bytes([guid[0], guid[1], guid[2], guid[3]]);
    let data2 = u16::from_le_bytes([guid[4], guid[5]]);
    let data3 = u16::from_le_bytes([guid[6], guid[7]]);
    let data4: String = guid[8..].iter().map(|b| format!("{:02X}", b)).collect();
    format!("{:08X}{:04X}{:04X}{}{:X}", data1, data2, data3, data4, age)
}
