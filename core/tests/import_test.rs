use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use library_core::fs::{ArchivePageSource, PageSource, SourceError};
use library_core::import;
use library_core::store::LibraryStore;
use tempfile::tempdir;
use zip::CompressionMethod;
use zip::write::FileOptions;

fn create_zip(path: &Path, files: &[&str]) {
    let file = File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Stored);
    for &name in files {
        zip.start_file(name, options).unwrap();
        zip.write_all(b"demo").unwrap();
    }
    zip.finish().unwrap();
}

#[test]
fn imports_a_directory_end_to_end() {
    let dir = tempdir().unwrap();
    let store = LibraryStore::open(dir.path().join("library")).unwrap();
    let source = dir.path().join("oneshot");
    fs::create_dir(&source).unwrap();
    for name in ["b.png", "a.jpg", "c10.png", "c2.png"] {
        fs::write(source.join(name), b"demo").unwrap();
    }

    let work = import::import(&store, &source).expect("import folder");
    assert_eq!(work.page_count, Some(4));
    assert_eq!(work.content_hash, None); // folders carry no content hash
    assert!(work.location.starts_with(store.root()));

    let reader = ArchivePageSource::open(&work.location).expect("reopen managed copy");
    assert_eq!(reader.page_count(), 4);
    let names: Vec<&str> = (0..reader.page_count()).map(|i| reader.page_name(i)).collect();
    assert_eq!(names, vec!["a.jpg", "b.png", "c2.png", "c10.png"]);
}

#[test]
fn imports_an_archive_end_to_end() {
    let dir = tempdir().unwrap();
    let store = LibraryStore::open(dir.path().join("library")).unwrap();
    let source = dir.path().join("vol1.cbz");
    create_zip(&source, &["p2.jpg", "p10.jpg", "p1.jpg"]);

    let work = import::import(&store, &source).expect("import archive");
    assert_eq!(work.page_count, Some(3));
    let hash = work.content_hash.as_deref().expect("archive gets a hash");
    assert_eq!(hash.len(), 64);
    assert_eq!(hash, import::content_hash(&work.location).unwrap());

    // The record landed in the catalog.
    let works = store.load().expect("load catalog");
    assert_eq!(works.len(), 1);
    assert_eq!(works[0].location, work.location);
    assert_eq!(works[0].content_hash.as_deref(), Some(hash));

    let reader = ArchivePageSource::open(&work.location).expect("reopen managed copy");
    let names: Vec<&str> = (0..reader.page_count()).map(|i| reader.page_name(i)).collect();
    assert_eq!(names, vec!["p1.jpg", "p2.jpg", "p10.jpg"]);
    assert_eq!(reader.page(0).expect("extract first page"), b"demo");
}

#[test]
fn import_is_idempotent_over_the_same_source() {
    let dir = tempdir().unwrap();
    let store = LibraryStore::open(dir.path().join("library")).unwrap();
    let source = dir.path().join("vol1.cbz");
    create_zip(&source, &["p1.jpg"]);

    let first = import::import_into_library(&store, &source).expect("first import");
    let second = import::import_into_library(&store, &source).expect("second import");
    assert_eq!(first, second);
    assert!(second.is_file());
}

#[test]
fn empty_zip_fails_but_empty_folder_opens() {
    let dir = tempdir().unwrap();

    let archive = dir.path().join("empty.cbz");
    create_zip(&archive, &["notes.txt"]);
    let err = ArchivePageSource::open(&archive).unwrap_err();
    assert!(matches!(err.downcast_ref::<SourceError>(), Some(SourceError::NoImages(_))));

    let folder = dir.path().join("empty-folder");
    fs::create_dir(&folder).unwrap();
    let reader = ArchivePageSource::open(&folder).expect("open empty folder");
    assert_eq!(reader.page_count(), 0);
}

#[test]
fn count_pages_failure_degrades_to_unknown() {
    let dir = tempdir().unwrap();
    let store = LibraryStore::open(dir.path().join("library")).unwrap();
    let source = dir.path().join("broken.cbz");
    fs::write(&source, b"this is not a zip file").unwrap();

    // The copy still succeeds, so the work exists with no page count.
    let work = import::import(&store, &source).expect("import still succeeds");
    assert_eq!(work.page_count, None);
    assert!(work.content_hash.is_some());
    assert_eq!(store.load().unwrap().len(), 1);
}
