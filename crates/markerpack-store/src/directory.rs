//! Directory-backed pack store.

use std::fs::{self, File};
use std::hash::BuildHasherDefault;
use std::io::Read;
use std::path::{Path, PathBuf};

use hashbrown::HashMap as FastHashMap;
use rustc_hash::FxHasher;
use walkdir::WalkDir;

use crate::path::has_extension;
use crate::store::sort_paths;
use crate::{normalize_path, DataStore, Error, Result};

type FxHashMap<K, V> = FastHashMap<K, V, BuildHasherDefault<FxHasher>>;

/// A pack unpacked into a directory.
///
/// The directory is walked once when the store is opened; files are looked up
/// through a case-insensitive index. Call [`DirectoryStore::refresh`] to pick
/// up files created afterwards.
#[derive(Debug)]
pub struct DirectoryStore {
    root: PathBuf,
    name: String,
    /// Normalized path -> pack-relative path with original casing.
    index: FxHashMap<String, String>,
}

impl DirectoryStore {
    /// Open a pack directory.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(Error::DirectoryNotFound(root.to_path_buf()));
        }

        let mut store = Self {
            root: root.to_path_buf(),
            name: root.display().to_string(),
            index: FxHashMap::default(),
        };
        store.refresh()?;

        Ok(store)
    }

    /// Re-walk the directory and rebuild the file index.
    pub fn refresh(&mut self) -> Result<()> {
        let mut index = FxHashMap::default();

        for entry in WalkDir::new(&self.root).follow_links(true) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let relative = relative.to_string_lossy().replace('\\', "/");
            index.insert(normalize_path(&relative), relative);
        }

        tracing::debug!(root = %self.root.display(), files = index.len(), "indexed pack directory");
        self.index = index;
        Ok(())
    }

    /// Root directory of the pack.
    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Option<PathBuf> {
        self.index
            .get(&normalize_path(path))
            .map(|relative| self.root.join(relative))
    }
}

impl DataStore for DirectoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn exists(&self, path: &str) -> bool {
        self.index.contains_key(&normalize_path(path))
    }

    fn read_bytes(&self, path: &str) -> Result<Option<Vec<u8>>> {
        match self.resolve(path) {
            Some(full) => Ok(Some(fs::read(full)?)),
            None => Ok(None),
        }
    }

    fn open(&self, path: &str) -> Result<Option<Box<dyn Read + Send + '_>>> {
        match self.resolve(path) {
            Some(full) => Ok(Some(Box::new(File::open(full)?))),
            None => Ok(None),
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    fn pack_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("Data/Trails")).unwrap();
        fs::write(dir.path().join("Pack.xml"), "<OverlayData/>").unwrap();
        fs::write(dir.path().join("Data/Extra.XML"), "<OverlayData/>").unwrap();
        fs::write(dir.path().join("Data/Trails/Loop.trl"), [0u8; 8]).unwrap();
        dir
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = DirectoryStore::open(dir.path().join("nope"));
        assert!(matches!(result, Err(Error::DirectoryNotFound(_))));
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let dir = pack_dir();
        let store = DirectoryStore::open(dir.path()).unwrap();

        assert!(store.exists("data\\trails\\LOOP.trl"));
        assert!(store.exists("./pack.xml"));
        assert!(!store.exists("missing.trl"));

        let bytes = store.read_bytes("DATA/Trails/loop.TRL").unwrap().unwrap();
        assert_eq!(bytes.len(), 8);
        assert!(store.read_bytes("missing.trl").unwrap().is_none());
    }

    #[test]
    fn test_open_streams_file() {
        let dir = pack_dir();
        let store = DirectoryStore::open(dir.path()).unwrap();

        let mut text = String::new();
        store.open("pack.xml").unwrap().unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "<OverlayData/>");
        assert!(store.open("nope.xml").unwrap().is_none());
    }

    #[test]
    fn test_enumerate_by_extension() {
        let dir = pack_dir();
        let store = DirectoryStore::open(dir.path()).unwrap();

        assert_eq!(store.enumerate(".xml").unwrap(), vec!["Data/Extra.XML", "Pack.xml"]);
        assert_eq!(store.enumerate("").unwrap().len(), 3);
    }

    #[test]
    fn test_refresh_sees_new_files() {
        let dir = pack_dir();
        let mut store = DirectoryStore::open(dir.path()).unwrap();
        fs::write(dir.path().join("late.xml"), "<a/>").unwrap();

        assert!(!store.exists("late.xml"));
        store.refresh().unwrap();
        assert!(store.exists("late.xml"));
    }
}
