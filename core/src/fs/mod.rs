//! File system access layer: page sources over archives and folders.

pub mod archive;
pub mod folder;
pub mod source;
mod util;

pub use archive::ZipPageSource;
pub use folder::FolderPageSource;
pub use source::{ArchivePageSource, PageSource, SourceError};
pub use util::{
    IMAGE_EXTENSIONS, Token, is_metadata_entry, is_supported_image, natural_cmp, natural_cmp_name,
    sanitize_zip_path, tokenize,
};

/// Shared result type for fs operations.
pub type Result<T> = crate::Result<T>;
