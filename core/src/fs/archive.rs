//! ZIP/CBZ archive page source.

use std::fmt;
use std::fs::{self, File};
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use parking_lot::Mutex;
use tracing::debug;
use zip::read::ZipArchive;

use crate::types::PageEntry;

use super::source::{PageSource, SourceError};
use super::{Result, util};

/// Archive reader backing. Path-backed by default; falls back to buffering
/// the whole file in memory when the streaming open trips zip edge cases
/// (unusual central-directory layouts).
enum Backing {
    File(File),
    Memory(Cursor<Vec<u8>>),
}

impl Read for Backing {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Backing::File(file) => file.read(buf),
            Backing::Memory(cursor) => cursor.read(buf),
        }
    }
}

impl Seek for Backing {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        match self {
            Backing::File(file) => file.seek(pos),
            Backing::Memory(cursor) => cursor.seek(pos),
        }
    }
}

struct ZipMember {
    entry: PageEntry,
    zip_index: usize,
}

/// Page source over a `.zip`/`.cbz` archive.
///
/// Eligible members are discovered once at construction; extraction happens
/// lazily per page. Each instance owns its archive handle, so independent
/// readers over the same file never share mutable state.
pub struct ZipPageSource {
    path: PathBuf,
    archive: Mutex<ZipArchive<Backing>>,
    members: Vec<ZipMember>,
}

impl ZipPageSource {
    /// Open an archive and enumerate its page-eligible members.
    ///
    /// Fails with [`SourceError::NoImages`] when filtering leaves nothing:
    /// callers must treat an imageless archive as an open failure, not as a
    /// valid zero-page work.
    pub fn open(path: &Path) -> Result<Self> {
        let mut archive = open_backing(path)?;
        let mut names = collect_member_names(&mut archive)?;
        if names.is_empty() {
            return Err(SourceError::NoImages(path.to_path_buf()).into());
        }

        names.sort_by(|a, b| util::natural_cmp_name(&a.0, &b.0));
        let members = names
            .into_iter()
            .enumerate()
            .map(|(index, (name, zip_index))| ZipMember { entry: PageEntry { name, index }, zip_index })
            .collect();

        Ok(Self { path: path.to_path_buf(), archive: Mutex::new(archive), members })
    }

    /// Path the archive was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PageSource for ZipPageSource {
    fn page_count(&self) -> usize {
        self.members.len()
    }

    fn page_name(&self, index: usize) -> &str {
        &self.members[index].entry.name
    }

    fn page(&self, index: usize) -> Result<Vec<u8>> {
        let member = &self.members[index];
        let mut archive = self.archive.lock();
        let mut file = archive
            .by_index(member.zip_index)
            .map_err(|err| anyhow!("{}", err))
            .with_context(|| format!("extracting {} from {:?}", member.entry.name, self.path))?;

        let mut bytes = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut bytes)
            .with_context(|| format!("reading {} from {:?}", member.entry.name, self.path))?;
        Ok(bytes)
    }
}

impl fmt::Debug for ZipPageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZipPageSource")
            .field("path", &self.path)
            .field("pages", &self.members.len())
            .finish()
    }
}

fn open_backing(path: &Path) -> Result<ZipArchive<Backing>> {
    let file = File::open(path).with_context(|| format!("opening archive {:?}", path))?;
    match ZipArchive::new(Backing::File(file)) {
        Ok(archive) => Ok(archive),
        Err(err) => {
            debug!("path-backed open of {:?} failed ({err}); retrying from memory", path);
            let bytes =
                fs::read(path).with_context(|| format!("buffering archive {:?}", path))?;
            ZipArchive::new(Backing::Memory(Cursor::new(bytes)))
                .map_err(|err| anyhow!("{}", err))
                .with_context(|| format!("opening archive {:?} from memory", path))
        }
    }
}

fn collect_member_names(archive: &mut ZipArchive<Backing>) -> Result<Vec<(String, usize)>> {
    let mut names: Vec<(String, usize)> = Vec::new();

    for idx in 0..archive.len() {
        let file = archive.by_index(idx).map_err(|err| anyhow!("{}", err))?;
        if file.is_dir() {
            continue;
        }

        let Some(enclosed) = file.enclosed_name() else {
            continue;
        };
        let Some(sanitized) = util::sanitize_zip_path(enclosed) else {
            continue;
        };

        let name = sanitized.to_string_lossy().replace('\\', "/");
        if util::is_metadata_entry(&name) || !util::is_supported_image(&sanitized) {
            continue;
        }

        names.push((name, idx));
    }

    Ok(names)
}
