//! Import pipeline: copy a work into managed storage, hash it, count pages.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::fs::{ArchivePageSource, PageSource};
use crate::store::LibraryStore;
use crate::types::Work;

pub type Result<T> = crate::Result<T>;

/// Chunk size for streaming hash computation. Archives can be large; they
/// are never pulled into memory wholesale just to hash them.
const HASH_CHUNK_BYTES: usize = 1024 * 1024;

/// Copy `source` (a file or a directory) into managed storage under its
/// original filename and return the managed path.
///
/// Re-importing an already-managed item is a no-op returning the same path.
/// An existing item with the same filename is replaced, never merged. A copy
/// canceled midway may leave a partial destination; the next import of the
/// same name overwrites it cleanly.
pub fn import_into_library(store: &LibraryStore, source: &Path) -> Result<PathBuf> {
    let file_name = source
        .file_name()
        .ok_or_else(|| anyhow!("source {:?} has no file name", source))?;
    let dest = store.root().join(file_name);

    if let (Ok(canonical_source), Ok(canonical_dest)) =
        (source.canonicalize(), dest.canonicalize())
    {
        if canonical_source == canonical_dest {
            debug!("{:?} is already managed; skipping copy", source);
            return Ok(dest);
        }
    }

    if dest.exists() {
        remove_existing(&dest)?;
    }
    copy_recursively(source, &dest)
        .with_context(|| format!("copying {:?} into library", source))?;
    Ok(dest)
}

/// Streaming SHA-256 of a file's byte content, as lowercase hex.
///
/// A read failure mid-stream aborts without producing a digest.
pub fn content_hash(path: &Path) -> Result<String> {
    if path.is_dir() {
        return Err(anyhow!("cannot hash directory {:?}", path));
    }

    let file = File::open(path).with_context(|| format!("opening {:?} for hashing", path))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_CHUNK_BYTES];

    loop {
        let n = reader.read(&mut buf).with_context(|| format!("hashing {:?}", path))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Number of page-eligible entries in the work at `path`. Open failures
/// propagate; the caller treats a missing count as "unknown", not fatal.
pub fn count_pages(path: &Path) -> Result<usize> {
    let source = ArchivePageSource::open(path)?;
    Ok(source.page_count())
}

/// Full import workflow: copy, hash, count, persist.
///
/// Only the copy is mandatory. Hashing and page counting degrade
/// independently: a work may legitimately end up with a location but no
/// hash and/or no page count. The resulting record is appended to the
/// catalog before returning.
pub fn import(store: &LibraryStore, source: &Path) -> Result<Work> {
    let location = import_into_library(store, source)?;
    let mut work = Work::new(&location);

    if location.is_dir() {
        debug!("skipping content hash for folder {:?}", location);
    } else {
        match content_hash(&location) {
            Ok(digest) => work.content_hash = Some(digest),
            Err(err) => warn!("hashing {:?} failed: {err:#}", location),
        }
    }

    match count_pages(&location) {
        Ok(count) => work.page_count = Some(u32::try_from(count).unwrap_or(u32::MAX)),
        Err(err) => warn!("counting pages of {:?} failed: {err:#}", location),
    }

    let mut works = store.load()?;
    works.push(work.clone());
    store.save(&works)?;
    Ok(work)
}

fn remove_existing(dest: &Path) -> Result<()> {
    if dest.is_dir() {
        fs::remove_dir_all(dest)
            .with_context(|| format!("replacing existing folder {:?}", dest))
    } else {
        fs::remove_file(dest).with_context(|| format!("replacing existing file {:?}", dest))
    }
}

fn copy_recursively(source: &Path, dest: &Path) -> Result<()> {
    if source.is_dir() {
        fs::create_dir_all(dest)?;
        for entry in fs::read_dir(source)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let target = dest.join(entry.file_name());
            if file_type.is_dir() {
                copy_recursively(&entry.path(), &target)?;
            } else if file_type.is_file() {
                fs::copy(entry.path(), &target)?;
            }
        }
        Ok(())
    } else {
        fs::copy(source, dest)
            .map(|_| ())
            .with_context(|| format!("copying {:?} to {:?}", source, dest))
    }
}
