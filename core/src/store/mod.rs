//! Persistent catalog storage.

pub mod library;

pub use library::LibraryStore;

pub type Result<T> = crate::Result<T>;
