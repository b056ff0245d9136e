//! Directory-backed page source.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::types::PageEntry;

use super::source::{PageSource, SourceError};
use super::{Result, util};

struct FolderPage {
    entry: PageEntry,
    path: PathBuf,
}

/// Page source over the immediate children of a plain directory.
///
/// Unlike the zip reader, a directory with zero eligible images is a valid
/// zero-page source: folders are accepted into the library without content
/// validation. Subdirectories are not descended into.
pub struct FolderPageSource {
    root: PathBuf,
    pages: Vec<FolderPage>,
}

impl FolderPageSource {
    pub fn open(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(SourceError::NotADirectory(root.to_path_buf()).into());
        }

        let mut found: Vec<(String, PathBuf)> = Vec::new();
        for entry in
            fs::read_dir(root).with_context(|| format!("listing folder {:?}", root))?
        {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }

            let path = entry.path();
            if !util::is_supported_image(&path) {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            found.push((name, path));
        }

        found.sort_by(|a, b| util::natural_cmp_name(&a.0, &b.0));
        let pages = found
            .into_iter()
            .enumerate()
            .map(|(index, (name, path))| FolderPage { entry: PageEntry { name, index }, path })
            .collect();

        Ok(Self { root: root.to_path_buf(), pages })
    }

    /// Directory the source was opened from.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl PageSource for FolderPageSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_name(&self, index: usize) -> &str {
        &self.pages[index].entry.name
    }

    fn page(&self, index: usize) -> Result<Vec<u8>> {
        let page = &self.pages[index];
        fs::read(&page.path).with_context(|| format!("reading page {:?}", page.path))
    }
}

impl std::fmt::Debug for FolderPageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FolderPageSource")
            .field("root", &self.root)
            .field("pages", &self.pages.len())
            .finish()
    }
}
