//! In-memory pack store.

use std::hash::BuildHasherDefault;

use hashbrown::HashMap as FastHashMap;
use rustc_hash::FxHasher;

use crate::path::has_extension;
use crate::store::sort_paths;
use crate::{normalize_path, DataStore, Result};

type FxHashMap<K, V> = FastHashMap<K, V, BuildHasherDefault<FxHasher>>;

/// A pack held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    name: String,
    /// Normalized path -> (path as inserted, contents).
    files: FxHashMap<String, (String, Vec<u8>)>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: FxHashMap::default(),
        }
    }

    /// Create a store from `(path, contents)` pairs.
    pub fn from_files<P, B>(name: impl Into<String>, files: impl IntoIterator<Item = (P, B)>) -> Self
    where
        P: Into<String>,
        B: Into<Vec<u8>>,
    {
        let mut store = Self::new(name);
        for (path, contents) in files {
            store.insert(path, contents);
        }
        store
    }

    /// Add or replace a file.
    pub fn insert(&mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) {
        let path = path.into();
        self.files.insert(normalize_path(&path), (path, contents.into()));
    }

    /// Remove a file, returning its contents.
    pub fn remove(&mut self, path: &str) -> Option<Vec<u8>> {
        self.files.remove(&normalize_path(path)).map(|(_, bytes)| bytes)
    }

    /// Number of files.
    #[inline]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if the store has no files.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl DataStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(&normalize_path(path))
    }

    fn read_bytes(&self, path: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .files
            .get(&normalize_path(path))
            .map(|(_, bytes)| bytes.clone()))
    }

    fn enumerate(&self, extension: &str) -> Result<Vec<String>> {
        let mut paths: Vec<String> = self
            .files
            .values()
            .map(|(path, _)| path)
            .filter(|p| has_extension(p, extension))
            .cloned()
            .collect();
        sort_paths(&mut paths);
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    #[test]
    fn test_insert_replaces_case_insensitively() {
        let mut store = MemoryStore::new("mem");
        store.insert("Trails/A.trl", vec![1]);
        store.insert("trails\\a.TRL", vec![2, 2]);

        assert_eq!(store.len(), 1);
        assert_eq!(store.read_bytes("TRAILS/a.trl").unwrap(), Some(vec![2, 2]));
    }

    #[test]
    fn test_default_open_reads_bytes() {
        let store = MemoryStore::from_files("mem", [("a.xml", "<a/>")]);

        let mut text = String::new();
        store.open("A.XML").unwrap().unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "<a/>");
        assert!(store.open("b.xml").unwrap().is_none());
    }

    #[test]
    fn test_enumerate_sorted() {
        let store = MemoryStore::from_files(
            "mem",
            [("map2.xml", ""), ("_markerCategories.xml", ""), ("Map10.xml", ""), ("a.trl", "")],
        );

        assert_eq!(
            store.enumerate(".xml").unwrap(),
            vec!["_markerCategories.xml", "Map10.xml", "map2.xml"]
        );
    }

    #[test]
    fn test_remove() {
        let mut store = MemoryStore::from_files("mem", [("a.xml", "x")]);
        assert_eq!(store.remove("A.xml"), Some(b"x".to_vec()));
        assert!(store.is_empty());
    }
}
