//! Zip-archive-backed pack store.

use std::fs::File;
use std::hash::BuildHasherDefault;
use std::io::Read;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use hashbrown::HashMap as FastHashMap;
use parking_lot::Mutex;
use rustc_hash::FxHasher;
use zip::ZipArchive;

use crate::path::has_extension;
use crate::store::sort_paths;
use crate::{normalize_path, DataStore, Result};

type FxHashMap<K, V> = FastHashMap<K, V, BuildHasherDefault<FxHasher>>;

/// Most idle archive handles kept for reuse.
const MAX_POOLED_HANDLES: usize = 8;

/// A pack stored as a zip archive (`.zip` / `.taco`).
///
/// `ZipArchive` needs `&mut self` to read an entry, so readers check out a
/// handle from a pool and return it when done. Threads that find the pool
/// empty open a fresh handle on the same file.
pub struct ArchiveStore {
    path: PathBuf,
    name: String,
    /// Normalized path -> entry name as stored in the archive.
    index: FxHashMap<String, String>,
    pool: Mutex<Vec<ZipArchive<File>>>,
}

impl ArchiveStore {
    /// Open a pack archive and index its entries.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let archive = ZipArchive::new(File::open(path)?)?;

        let index: FxHashMap<String, String> = archive
            .file_names()
            .filter(|n| !n.ends_with('/'))
            .map(|n| (normalize_path(n), n.to_string()))
            .collect();

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        tracing::debug!(archive = %path.display(), entries = index.len(), "opened pack archive");

        Ok(Self {
            path: path.to_path_buf(),
            name,
            index,
            pool: Mutex::new(vec![archive]),
        })
    }

    /// Path of the archive file.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of file entries in the archive.
    #[inline]
    pub fn entry_count(&self) -> usize {
        self.index.len()
    }

    fn checkout(&self) -> Result<PooledArchive<'_>> {
        let pooled = self.pool.lock().pop();
        let archive = match pooled {
            Some(archive) => archive,
            None => ZipArchive::new(File::open(&self.path)?)?,
        };

        Ok(PooledArchive {
            pool: &self.pool,
            archive: Some(archive),
        })
    }
}

impl std::fmt::Debug for ArchiveStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveStore")
            .field("path", &self.path)
            .field("entries", &self.index.len())
            .finish()
    }
}

impl DataStore for ArchiveStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn exists(&self, path: &str) -> bool {
        self.index.contains_key(&normalize_path(path))
    }

    fn read_bytes(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let Some(entry_name) = self.index.get(&normalize_path(path)) else {
            return Ok(None);
        };

        let mut archive = self.checkout()?;
        let mut entry = archive.by_name(entry_name)?;

        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data)?;

        Ok(Some(data))
    }

    fn enumerate(&self, extension: &str) -> Result<Vec<String>> {
        let mut paths: Vec<String> = self
            .index
            .values()
            .filter(|p| has_extension(p, extension))
            .cloned()
            .collect();
        sort_paths(&mut paths);
        Ok(paths)
    }
}

/// An archive handle on loan from the pool.
struct PooledArchive<'a> {
    pool: &'a Mutex<Vec<ZipArchive<File>>>,
    archive: Option<ZipArchive<File>>,
}

impl Deref for PooledArchive<'_> {
    type Target = ZipArchive<File>;

    fn deref(&self) -> &Self::Target {
        self.archive.as_ref().expect("archive present until drop")
    }
}

impl DerefMut for PooledArchive<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.archive.as_mut().expect("archive present until drop")
    }
}

impl Drop for PooledArchive<'_> {
    fn drop(&mut self) {
        if let Some(archive) = self.archive.take() {
            let mut pool = self.pool.lock();
            if pool.len() < MAX_POOLED_HANDLES {
                pool.push(archive);
            }
        }
    }
}
