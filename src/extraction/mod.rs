//! Cabinet archive extraction
//!
//! Symbol servers usually store PDBs as single-file cabinets (`foo.pd_`). Backends
//! implement [`Extractor`]: [`CliCabExtractor`] drives `cabextract` (or `expand` on
//! Windows), [`BuiltinCabExtractor`] unpacks in-process with the `cab` crate, and
//! [`NoOpExtractor`] stands in when no tool is available.

mod builtin;
mod cli;
mod noop;
mod traits;

pub use builtin::BuiltinCabExtractor;
pub use cli::{CabTool, CliCabExtractor};
pub use noop::NoOpExtractor;
pub use traits::Extractor;

/// Build an in-memory cabinet holding `entries`
#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) fn build_cabinet(entries: &[(&str, &[u8])]) -> Vec<u8> {
    use std::io::{Cursor, Write};

    let mut builder = cab::CabinetBuilder::new();
    {
        let folder = builder.add_folder(cab::CompressionType::MsZip);
        for (name, _) in entries {
            folder.add_file(*name);
        }
    }
    let mut writer = builder.build(Cursor::new(Vec::new())).unwrap();
    let mut contents = entries.iter();
    while let Some(mut file_writer) = writer.next_file().unwrap() {
        let (_, data) = contents.next().unwrap();
        file_writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
