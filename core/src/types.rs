//! Shared data structures exchanged between the core and its host shell.

use std::path::PathBuf;

use uuid::Uuid;

/// Opaque identifier for a catalog entry.
///
/// Ids are generated at creation time and are stable for the lifetime of the
/// in-memory entry; they are not persisted, so a fresh id is minted whenever
/// the catalog is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkId(Uuid);

impl WorkId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for WorkId {
    fn default() -> Self {
        Self::new()
    }
}

/// One imported item in the library catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Work {
    pub id: WorkId,
    /// Path to the managed copy inside library storage. This is the sole
    /// handle used to re-open the item for reading.
    pub location: PathBuf,
    /// Lowercase hex SHA-256 of the managed copy, if hashing succeeded.
    pub content_hash: Option<String>,
    /// Number of page-eligible entries discovered at import time, if counting
    /// succeeded.
    pub page_count: Option<u32>,
}

impl Work {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self { id: WorkId::new(), location: location.into(), content_hash: None, page_count: None }
    }

    /// File name of the managed copy, used as the persisted catalog key.
    pub fn file_name(&self) -> Option<&str> {
        self.location.file_name().and_then(|name| name.to_str())
    }
}

/// One addressable page inside an opened source. Transient: discovered when
/// the reader is constructed and never persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEntry {
    /// Original entry path or filename, used for ordering and display.
    pub name: String,
    /// Zero-based position in the reader's canonical order.
    pub index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn work_ids_are_unique() {
        assert_ne!(WorkId::new(), WorkId::new());
    }

    #[test]
    fn work_exposes_file_name() {
        let work = Work::new("/library/vol1.cbz");
        assert_eq!(work.file_name(), Some("vol1.cbz"));
        assert_eq!(work.content_hash, None);
        assert_eq!(work.page_count, None);
    }
}
