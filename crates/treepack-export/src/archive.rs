//! Deterministic ZIP packing with atomic persistence.

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::Path;

use thiserror::Error;
use tracing::debug;
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

use crate::atomic::{WriteError, write_atomic};

/// Errors from archive packing.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// An entry header could not be encoded.
    #[error("Failed to encode archive entry {name}: {source}")]
    Entry {
        name: String,
        #[source]
        source: zip::result::ZipError,
    },

    /// An entry body could not be written.
    #[error("Failed to write archive entry {name}: {source}")]
    EntryWrite {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// The archive trailer could not be finished.
    #[error("Failed to finish archive: {source}")]
    Finish {
        #[source]
        source: zip::result::ZipError,
    },

    /// The finished archive could not be persisted.
    #[error(transparent)]
    Persist(#[from] WriteError),
}

/// Encode `entries` (relative name -> content) as a ZIP archive in memory.
///
/// Entries are written in lexicographic name order regardless of the map's
/// iteration order, with fixed timestamps, so identical inputs produce
/// byte-identical archives. Any entry failure aborts the whole pack.
pub fn pack(entries: &HashMap<String, Vec<u8>>) -> Result<Vec<u8>, ArchiveError> {
    let mut names: Vec<&String> = entries.keys().collect();
    names.sort();

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for name in names {
        // Fixed modification time keeps repeated packs byte-identical.
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        writer
            .start_file(name.as_str(), options)
            .map_err(|source| ArchiveError::Entry {
                name: name.clone(),
                source,
            })?;
        writer
            .write_all(&entries[name.as_str()])
            .map_err(|source| ArchiveError::EntryWrite {
                name: name.clone(),
                source,
            })?;
    }

    let cursor = writer
        .finish()
        .map_err(|source| ArchiveError::Finish { source })?;
    Ok(cursor.into_inner())
}

/// Pack `entries` and atomically persist the archive at `dest`.
pub fn pack_atomic(entries: &HashMap<String, Vec<u8>>, dest: &Path) -> Result<(), ArchiveError> {
    let bytes = pack(entries)?;
    write_atomic(dest, &bytes)?;
    debug!(path = %dest.display(), entries = entries.len(), "packed archive");
    Ok(())
}
