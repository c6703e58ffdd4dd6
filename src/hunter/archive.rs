//! ZIP archive assembly
//!
//! The worker collects fetched icon bytes in memory and writes the archive
//! in one pass. Writing is synchronous (the `zip` crate is blocking); the
//! worker calls this from `spawn_blocking`.

use crate::error::Result;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// One file inside the output archive
#[derive(Clone, Debug)]
pub struct ArchiveEntry {
    /// Path of the file inside the archive (e.g. `Signal/Signal_128x128.png`)
    pub name: String,
    /// Raw file contents
    pub bytes: Vec<u8>,
}

/// Write all entries into a ZIP archive at `path`
///
/// Icons are already compressed image formats, but Deflate still trims the
/// archive metadata and the occasional uncompressed PNG.
pub fn write_archive(path: &Path, entries: &[ArchiveEntry]) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in entries {
        writer.start_file(&entry.name, options)?;
        writer.write_all(&entry.bytes)?;
    }

    writer.finish()?;
    Ok(())
}
