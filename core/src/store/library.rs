//! The library catalog: managed storage root plus the persisted work index.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use directories::ProjectDirs;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::types::Work;

use super::Result;

const APP_QUALIFIER: &str = "com";
const APP_ORGANISATION: &str = "LocalComicLibrary";
const APP_NAME: &str = "local-comic-library";

const CATALOG_FILE: &str = "library.json";

/// On-disk record shape. `filename` is relative to the managed root, an
/// empty `hash` means "no hash", and a missing `pageCount` means "unknown".
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WorkRecord {
    filename: String,
    hash: String,
    page_count: Option<u32>,
}

/// Catalog store rooted at one managed-storage directory.
///
/// The root holds the imported works (by their original filename) and the
/// catalog file side by side. Constructed explicitly and passed to whoever
/// needs it, so tests can run against their own temporary roots. Load/save
/// pairs are serialized through an internal lock; across stores the policy
/// is last-writer-wins.
#[derive(Debug)]
pub struct LibraryStore {
    root: PathBuf,
    catalog_path: PathBuf,
    lock: Mutex<()>,
}

impl LibraryStore {
    /// Open (creating lazily) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let catalog_path = root.join(CATALOG_FILE);
        Ok(Self { root, catalog_path, lock: Mutex::new(()) })
    }

    /// Open a store at the per-user default location.
    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_root()?)
    }

    /// Per-user managed storage root under the platform data directory.
    pub fn default_root() -> Result<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANISATION, APP_NAME)
            .map(|dirs| dirs.data_dir().join("Library"))
            .ok_or_else(|| anyhow!("unable to resolve application data directory"))
    }

    /// Managed storage root; imported works live directly under it.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn catalog_path(&self) -> &Path {
        &self.catalog_path
    }

    /// Load the catalog. A missing catalog file yields an empty list.
    ///
    /// Self-healing: records whose backing file no longer exists under the
    /// root are dropped without raising an error.
    pub fn load(&self) -> Result<Vec<Work>> {
        let _guard = self.lock.lock();
        let records = self.read_records()?;

        let mut works = Vec::with_capacity(records.len());
        for record in records {
            let location = self.root.join(&record.filename);
            if !location.exists() {
                debug!("dropping catalog entry {:?}: backing file missing", record.filename);
                continue;
            }
            let mut work = Work::new(location);
            work.content_hash = (!record.hash.is_empty()).then(|| record.hash);
            work.page_count = record.page_count;
            works.push(work);
        }
        Ok(works)
    }

    /// Replace the persisted catalog with `works`. Atomic: the new contents
    /// are written to a temporary file and renamed over the catalog, so a
    /// crash mid-save leaves the previous state intact.
    pub fn save(&self, works: &[Work]) -> Result<()> {
        let _guard = self.lock.lock();

        let records: Vec<WorkRecord> = works
            .iter()
            .filter_map(|work| {
                let Some(filename) = work.file_name() else {
                    debug!("skipping work {:?}: location has no file name", work.location);
                    return None;
                };
                Some(WorkRecord {
                    filename: filename.to_string(),
                    hash: work.content_hash.clone().unwrap_or_default(),
                    page_count: work.page_count,
                })
            })
            .collect();

        self.write_records(&records)
    }

    fn read_records(&self) -> Result<Vec<WorkRecord>> {
        match fs::read(&self.catalog_path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn write_records(&self, records: &[WorkRecord]) -> Result<()> {
        let data = serde_json::to_vec_pretty(records)?;
        let mut temp = NamedTempFile::new_in(&self.root)?;
        temp.write_all(&data)?;
        temp.flush()?;
        match temp.persist(&self.catalog_path) {
            Ok(_) => Ok(()),
            Err(err) => {
                // Windows refuses to rename over an existing file.
                if err.error.kind() == io::ErrorKind::AlreadyExists {
                    if let Err(remove_err) = fs::remove_file(&self.catalog_path) {
                        if remove_err.kind() != io::ErrorKind::NotFound {
                            return Err(remove_err.into());
                        }
                    }
                    err.file
                        .persist(&self.catalog_path)
                        .map(|_| ())
                        .map_err(|persist_err| persist_err.error.into())
                } else {
                    Err(err.error.into())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_catalog_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = LibraryStore::open(dir.path().join("library")).unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn tolerates_records_with_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = LibraryStore::open(dir.path()).unwrap();
        fs::write(store.root().join("vol1.cbz"), b"zip").unwrap();
        fs::write(store.catalog_path(), br#"[{"filename": "vol1.cbz"}]"#).unwrap();

        let works = store.load().unwrap();
        assert_eq!(works.len(), 1);
        assert_eq!(works[0].content_hash, None);
        assert_eq!(works[0].page_count, None);
    }

    #[test]
    fn empty_hash_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = LibraryStore::open(dir.path()).unwrap();
        fs::write(store.root().join("vol1.cbz"), b"zip").unwrap();
        fs::write(
            store.catalog_path(),
            br#"[{"filename": "vol1.cbz", "hash": "", "pageCount": 3}]"#,
        )
        .unwrap();

        let works = store.load().unwrap();
        assert_eq!(works[0].content_hash, None);
        assert_eq!(works[0].page_count, Some(3));
    }
}
