//! The unified page source: one contract over the two concrete readers.

use std::path::Path;

use thiserror::Error;

use super::archive::ZipPageSource;
use super::folder::FolderPageSource;
use super::Result;

/// Failures that make a source unopenable, as opposed to plain I/O errors.
/// Callers can downcast to this to distinguish "not a readable work" from
/// "disk trouble".
#[derive(Debug, Error)]
pub enum SourceError {
    /// The archive opened fine but contained zero page-eligible entries.
    /// An empty archive is an open failure, never a valid zero-page work.
    #[error("no images found in archive {0:?}")]
    NoImages(std::path::PathBuf),
    /// The path had no archive extension but was not a directory either.
    #[error("{0:?} is not a directory")]
    NotADirectory(std::path::PathBuf),
}

/// Ordered, randomly-addressable access to the raw bytes of each page.
///
/// Page indices are assigned once at construction and stay stable for the
/// lifetime of the reader; re-opening the same unmodified source yields the
/// same order.
pub trait PageSource {
    /// Total number of eligible pages. O(1) after construction.
    fn page_count(&self) -> usize;

    /// Original entry name for the page at `index`.
    ///
    /// # Panics
    /// Panics if `index >= page_count()`; an out-of-range index is a caller
    /// bug, not a recoverable condition.
    fn page_name(&self, index: usize) -> &str;

    /// Fully materialize the raw bytes of page `index`, decompressing if
    /// needed.
    ///
    /// # Panics
    /// Panics if `index >= page_count()`.
    fn page(&self, index: usize) -> Result<Vec<u8>>;
}

/// Façade over the two concrete readers. Closed dispatch: exactly these two
/// variants, chosen by the input path's extension.
#[derive(Debug)]
pub enum ArchivePageSource {
    Zip(ZipPageSource),
    Folder(FolderPageSource),
}

impl ArchivePageSource {
    /// Open `path` with the reader matching its shape: `zip`/`cbz`
    /// extensions (case-insensitive) route to the zip reader, everything
    /// else is treated as a folder. Construction failures of the underlying
    /// reader propagate unchanged.
    pub fn open(path: &Path) -> Result<Self> {
        if is_zip_extension(path) {
            Ok(Self::Zip(ZipPageSource::open(path)?))
        } else {
            Ok(Self::Folder(FolderPageSource::open(path)?))
        }
    }
}

impl PageSource for ArchivePageSource {
    fn page_count(&self) -> usize {
        match self {
            Self::Zip(zip) => zip.page_count(),
            Self::Folder(folder) => folder.page_count(),
        }
    }

    fn page_name(&self, index: usize) -> &str {
        match self {
            Self::Zip(zip) => zip.page_name(index),
            Self::Folder(folder) => folder.page_name(index),
        }
    }

    fn page(&self, index: usize) -> Result<Vec<u8>> {
        match self {
            Self::Zip(zip) => zip.page(index),
            Self::Folder(folder) => folder.page(index),
        }
    }
}

fn is_zip_extension(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()).map(|ext| ext.to_ascii_lowercase()),
        Some(ref ext) if ext == "zip" || ext == "cbz"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_by_extension() {
        assert!(is_zip_extension(Path::new("vol1.cbz")));
        assert!(is_zip_extension(Path::new("vol1.ZIP")));
        assert!(!is_zip_extension(Path::new("vol1.rar")));
        assert!(!is_zip_extension(Path::new("chapter-1")));
    }

    #[test]
    fn unknown_extension_is_treated_as_folder_and_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.rar");
        std::fs::write(&path, b"not a dir").unwrap();

        let err = ArchivePageSource::open(&path).unwrap_err();
        assert!(matches!(err.downcast_ref::<SourceError>(), Some(SourceError::NotADirectory(_))));
    }
}
