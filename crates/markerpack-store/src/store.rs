//! The byte store abstraction.

use std::io::{Cursor, Read};
use std::sync::Arc;

use crate::Result;

/// Read-only access to the files of a marker pack.
///
/// Paths are pack-relative, case-insensitive, and may use `/` or `\`.
/// Implementations must tolerate concurrent readers.
pub trait DataStore: Send + Sync {
    /// Human-readable name of the backing directory or archive.
    fn name(&self) -> &str;

    /// Check whether a file exists.
    fn exists(&self, path: &str) -> bool;

    /// Read a whole file.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    fn read_bytes(&self, path: &str) -> Result<Option<Vec<u8>>>;

    /// Open a file for streaming reads.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    fn open(&self, path: &str) -> Result<Option<Box<dyn Read + Send + '_>>> {
        Ok(self
            .read_bytes(path)?
            .map(|bytes| Box::new(Cursor::new(bytes)) as Box<dyn Read + Send>))
    }

    /// List every file whose name ends with `extension` (for example
    /// `".xml"`), sorted case-insensitively. An empty extension lists all
    /// files.
    fn enumerate(&self, extension: &str) -> Result<Vec<String>>;
}

impl<T: DataStore + ?Sized> DataStore for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn exists(&self, path: &str) -> bool {
        (**self).exists(path)
    }

    fn read_bytes(&self, path: &str) -> Result<Option<Vec<u8>>> {
        (**self).read_bytes(path)
    }

    fn open(&self, path: &str) -> Result<Option<Box<dyn Read + Send + '_>>> {
        (**self).open(path)
    }

    fn enumerate(&self, extension: &str) -> Result<Vec<String>> {
        (**self).enumerate(extension)
    }
}

impl<T: DataStore + ?Sized> DataStore for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn exists(&self, path: &str) -> bool {
        (**self).exists(path)
    }

    fn read_bytes(&self, path: &str) -> Result<Option<Vec<u8>>> {
        (**self).read_bytes(path)
    }

    fn open(&self, path: &str) -> Result<Option<Box<dyn Read + Send + '_>>> {
        (**self).open(path)
    }

    fn enumerate(&self, extension: &str) -> Result<Vec<String>> {
        (**self).enumerate(extension)
    }
}

/// Sort store paths case-insensitively, the order every store enumerates in.
pub(crate) fn sort_paths(paths: &mut [String]) {
    paths.sort_by_cached_key(|p| crate::normalize_path(p));
}
