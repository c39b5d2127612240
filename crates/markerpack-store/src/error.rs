//! Error types for pack stores.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when opening or reading a pack store.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Zip archive error.
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Directory walk error.
    #[error("directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Pack directory does not exist.
    #[error("directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// Pack path is neither a directory nor an archive file.
    #[error("not a marker pack: {}", .0.display())]
    NotAPack(PathBuf),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, Error>;
