//! Core library for the local comic library: archive reading and imports.

#![deny(missing_debug_implementations)]

pub mod fs;
pub mod import;
pub mod log;
pub mod store;
pub mod types;

pub type Result<T> = std::result::Result<T, anyhow::Error>;

pub use fs::{ArchivePageSource, FolderPageSource, PageSource, SourceError, ZipPageSource};
pub use store::LibraryStore;
pub use types::{PageEntry, Work, WorkId};

/// Returns the version of the core crate for telemetry and debugging.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
