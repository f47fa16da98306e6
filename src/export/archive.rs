//! ZIP bundling of the per-chunk workbooks.

use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Result, XlsplitError};

/// One file inside the output archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub file_name: String,
    pub content: Vec<u8>,
}

/// Collects entries in insertion order, then writes them as one ZIP.
#[derive(Debug, Default)]
pub struct ArchiveBuilder {
    entries: Vec<ArchiveEntry>,
}

impl ArchiveBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry. A name that is already present has its content
    /// replaced in place, keeping the original position.
    pub fn add(&mut self, file_name: impl Into<String>, content: Vec<u8>) {
        let file_name = file_name.into();
        if let Some(existing) = self.entries.iter_mut().find(|e| e.file_name == file_name) {
            tracing::warn!(file_name = %file_name, "duplicate archive entry replaced");
            existing.content = content;
            return;
        }
        self.entries.push(ArchiveEntry { file_name, content });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry names in archive order.
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.file_name.as_str())
    }

    /// Write every entry into one deflate-compressed ZIP.
    pub fn finish(self) -> Result<Vec<u8>> {
        write_zip(
            self.entries
                .iter()
                .map(|e| (e.file_name.as_str(), e.content.as_slice())),
        )
    }
}

/// Write `(name, bytes)` pairs as ZIP members, in order.
///
/// Timestamps are pinned so equal input gives byte-identical output.
pub(crate) fn write_zip<'a>(entries: impl Iterator<Item = (&'a str, &'a [u8])>) -> Result<Vec<u8>> {
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, bytes) in entries {
        writer
            .start_file(name, options)
            .map_err(|e| XlsplitError::Serialization(format!("{name}: {e}")))?;
        writer
            .write_all(bytes)
            .map_err(|e| XlsplitError::Serialization(format!("{name}: {e}")))?;
    }
    let cursor = writer.finish().map_err(XlsplitError::serialization)?;
    Ok(cursor.into_inner())
}
