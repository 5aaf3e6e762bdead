use crate::error::{Result, SegmentError};
use flate2::read::GzDecoder;
use std::io::Read;
use tar::Archive;

/// One regular-file entry pulled out of the archive.
pub struct Entry {
    pub name: String,
    pub contents: Vec<u8>,
}

/// Visit every regular-file entry of a gzip-compressed tar stream, in
/// encounter order. Directories and special entries are skipped. The stream
/// is consumed in a single pass and is not restartable; callers must not
/// assume anything about entry ordering.
pub fn read_entries<R, F>(reader: R, mut visit: F) -> Result<()>
where
    R: Read,
    F: FnMut(Entry) -> Result<()>,
{
    let gz = GzDecoder::new(reader);
    let mut tar = Archive::new(gz);

    for entry in tar.entries().map_err(corrupt)? {
        let mut entry = entry.map_err(corrupt)?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let name = entry
            .path()
            .map_err(corrupt)?
            .to_string_lossy()
            .into_owned();

        let mut contents = Vec::new();
        entry.read_to_end(&mut contents).map_err(corrupt)?;

        visit(Entry { name, contents })?;
    }

    Ok(())
}

fn corrupt(err: std::io::Error) -> SegmentError {
    SegmentError::ArchiveCorrupt(err.to_string())
}
