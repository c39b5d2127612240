//! Marker pack loading.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use markerpack_store::{
    ArchiveStore, DataStore, DirectoryStore, PackResourceManager, ResourceCacheSettings,
};
use markerpack_xml::XmlDocument;
use rayon::prelude::*;

use crate::collection::FilteredPackCollection;
use crate::consts::{optimized_map_file, FILE_OPTIMIZED_CATEGORIES};
use crate::reader::{PackReader, PackTarget, PopulateStats, ReaderSettings};
use crate::{Error, PackCollection, PointOfInterest, Result};

/// A marker pack opened from a directory, an archive or any other store.
///
/// A pack that contains `_markerCategories.xml` is *optimized*: its POIs
/// are split into one `map{N}.xml` per map, so a single map can be loaded
/// without reading the rest of the pack.
pub struct Pack {
    store: Arc<dyn DataStore>,
    resources: PackResourceManager,
    settings: ReaderSettings,
    optimized: bool,
}

impl Pack {
    /// Open a pack directory or archive file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.is_dir() {
            Ok(Self::from_store(DirectoryStore::open(path)?))
        } else if path.is_file() {
            Ok(Self::from_store(ArchiveStore::open(path)?))
        } else {
            Err(markerpack_store::Error::NotAPack(path.to_path_buf()).into())
        }
    }

    /// Use an existing store.
    pub fn from_store<S: DataStore + 'static>(store: S) -> Self {
        Self::from_shared_store(Arc::new(store))
    }

    /// Use a shared store.
    pub fn from_shared_store(store: Arc<dyn DataStore>) -> Self {
        let optimized = store.exists(FILE_OPTIMIZED_CATEGORIES);
        let resources = PackResourceManager::new(Arc::clone(&store));

        tracing::debug!(pack = store.name(), optimized, "opened marker pack");

        Self {
            store,
            resources,
            settings: ReaderSettings::default(),
            optimized,
        }
    }

    /// Use custom reader settings.
    pub fn with_settings(mut self, settings: ReaderSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Use custom resource cache settings.
    pub fn with_cache_settings(mut self, settings: ResourceCacheSettings) -> Self {
        self.resources = PackResourceManager::with_settings(Arc::clone(&self.store), settings);
        self
    }

    /// Name of the backing directory or archive.
    #[inline]
    pub fn name(&self) -> &str {
        self.store.name()
    }

    #[inline]
    pub fn store(&self) -> &Arc<dyn DataStore> {
        &self.store
    }

    /// Cached access to trail data, textures and icons.
    #[inline]
    pub fn resources(&self) -> &PackResourceManager {
        &self.resources
    }

    #[inline]
    pub fn settings(&self) -> &ReaderSettings {
        &self.settings
    }

    /// Whether the pack uses the optimized per-map layout.
    #[inline]
    pub fn is_optimized(&self) -> bool {
        self.optimized
    }

    /// Paths of every overlay document, sorted.
    pub fn documents(&self) -> Result<Vec<String>> {
        Ok(self.store.enumerate(".xml")?)
    }

    fn reader(&self) -> PackReader<'_> {
        PackReader::with_settings(&self.resources, self.settings.clone())
    }

    /// Load every overlay document.
    pub fn load_all(&self) -> Result<PackCollection> {
        self.load_all_with(|_, _, _| {}, &AtomicBool::new(false))
    }

    /// Load every overlay document, reporting progress and honouring
    /// `cancel`.
    ///
    /// `progress` is called after each document with the number of
    /// documents applied, the total, and the document path.
    pub fn load_all_with<F>(&self, progress: F, cancel: &AtomicBool) -> Result<PackCollection>
    where
        F: FnMut(usize, usize, &str),
    {
        let mut collection = PackCollection::new();
        self.load_all_into(&mut collection, progress, cancel)?;
        Ok(collection)
    }

    /// Load every overlay document into `target`.
    ///
    /// Documents are read and parsed in parallel, then applied one at a time
    /// in path order so the result does not depend on scheduling. Documents
    /// that fail to read or parse are logged and skipped. `cancel` is
    /// checked between documents; a cancelled load returns
    /// [`Error::Cancelled`] and leaves the documents applied so far in
    /// `target`.
    pub fn load_all_into<T, F>(
        &self,
        target: &mut T,
        mut progress: F,
        cancel: &AtomicBool,
    ) -> Result<PopulateStats>
    where
        T: PackTarget + ?Sized,
        F: FnMut(usize, usize, &str),
    {
        let start = Instant::now();
        let documents = self.documents()?;
        let reader = self.reader();

        let parsed: Vec<Option<XmlDocument>> = documents
            .par_iter()
            .map(|path| {
                if cancel.load(Ordering::Relaxed) {
                    return None;
                }
                self.read_document(&reader, path)
            })
            .collect();

        let total = documents.len();
        let mut stats = PopulateStats::default();
        for (done, (path, document)) in documents.iter().zip(parsed).enumerate() {
            if cancel.load(Ordering::Relaxed) {
                tracing::info!(pack = self.name(), applied = done, total, "load cancelled");
                return Err(Error::Cancelled);
            }
            if let Some(document) = document {
                stats += reader.apply(target, &document);
            }
            progress(done + 1, total, path);
        }

        tracing::info!(
            pack = self.name(),
            documents = total,
            categories = stats.categories,
            pois = stats.pois,
            skipped = stats.skipped,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "loaded marker pack"
        );

        Ok(stats)
    }

    /// Load the categories and the POIs of a single map.
    pub fn load_map(&self, map_id: i32) -> Result<PackCollection> {
        let mut collection = PackCollection::new();

        if self.optimized {
            let reader = self.reader();
            for path in [FILE_OPTIMIZED_CATEGORIES.to_string(), optimized_map_file(map_id)] {
                if let Some(document) = self.read_document(&reader, &path) {
                    reader.apply(&mut collection, &document);
                }
            }
        } else {
            let mut filtered =
                FilteredPackCollection::new(&mut collection, |poi: &PointOfInterest| {
                    poi.map_id() == map_id
                });
            self.load_all_into(&mut filtered, |_, _, _| {}, &AtomicBool::new(false))?;
        }

        Ok(collection)
    }

    fn read_document(&self, reader: &PackReader<'_>, path: &str) -> Option<XmlDocument> {
        let bytes = match self.store.read_bytes(path) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                tracing::debug!(document = path, "overlay document not present");
                return None;
            }
            Err(e) => {
                tracing::warn!(document = path, error = %e, "failed to read overlay document");
                return None;
            }
        };

        match reader.parse(&String::from_utf8_lossy(&bytes)) {
            Ok(document) => Some(document),
            Err(e) => {
                tracing::warn!(document = path, error = %e, "skipping unparsable overlay document");
                None
            }
        }
    }
}

impl std::fmt::Debug for Pack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pack")
            .field("name", &self.name())
            .field("optimized", &self.optimized)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use markerpack_store::MemoryStore;
    use markerpack_trl::{encode, Point3, TrailSection};

    use super::*;

    fn full_pack() -> MemoryStore {
        let trail = encode(50, &[TrailSection::new(50, vec![Point3::new(1.0, 2.0, 3.0)])]);

        MemoryStore::from_files(
            "full",
            [
                (
                    "categories.xml",
                    br#"<OverlayData>
                        <MarkerCategory name="tyria"><MarkerCategory name="hearts"/></MarkerCategory>
                    </OverlayData>"#
                        .to_vec(),
                ),
                (
                    "Data/queensdale.xml",
                    br#"<OverlayData><POIs>
                        <POI type="tyria.hearts" mapid="15"/>
                        <POI type="tyria.hearts" mapid="15"/>
                        <Trail type="tyria" traildata="Data/loop.trl"/>
                    </POIs></OverlayData>"#
                        .to_vec(),
                ),
                ("Data/broken.xml", b"<OverlayData><POIs></OverlayData>".to_vec()),
                ("Data/loop.trl", trail),
            ],
        )
    }

    #[test]
    fn test_load_all_skips_broken_documents() {
        let pack = Pack::from_store(full_pack());
        assert!(!pack.is_optimized());

        let collection = pack.load_all().unwrap();
        let tree = collection.categories();

        assert_eq!(tree.len(), 2);
        assert_eq!(collection.pois().len(), 3);
        assert_eq!(collection.map_ids(), vec![15, 50]);

        let hearts = tree.find("tyria.hearts").unwrap();
        assert!(tree[hearts].loaded_from_pack());
        assert_eq!(tree[hearts].members().len(), 2);
    }

    #[test]
    fn test_load_map_from_full_pack() {
        let pack = Pack::from_store(full_pack());

        let collection = pack.load_map(50).unwrap();
        assert_eq!(collection.pois().len(), 1);
        assert_eq!(collection.pois()[0].map_id(), 50);
        // Categories are never filtered.
        assert!(collection.categories().find("tyria.hearts").is_some());
    }

    #[test]
    fn test_load_map_from_optimized_pack() {
        let store = MemoryStore::from_files(
            "optimized",
            [
                (
                    "_markerCategories.xml",
                    r#"<OverlayData><MarkerCategory name="a" iconsize="2"/></OverlayData>"#,
                ),
                ("map15.xml", r#"<OverlayData><POIs><POI type="a"/></POIs></OverlayData>"#),
                (
                    "map50.xml",
                    r#"<OverlayData><POIs><POI type="a"/><POI type="a"/></POIs></OverlayData>"#,
                ),
            ],
        );
        let pack = Pack::from_store(store);
        assert!(pack.is_optimized());

        let collection = pack.load_map(50).unwrap();
        assert_eq!(collection.pois().len(), 2);
        assert_eq!(
            collection
                .categories()
                .aggregated_value(&collection.pois()[0], "iconsize"),
            Some("2")
        );

        let empty = pack.load_map(99).unwrap();
        assert!(empty.pois().is_empty());
        assert_eq!(empty.categories().len(), 1);
    }

    #[test]
    fn test_progress_and_cancel() {
        let pack = Pack::from_store(full_pack());

        let mut seen = Vec::new();
        pack.load_all_with(
            |done, total, path| seen.push((done, total, path.to_string())),
            &AtomicBool::new(false),
        )
        .unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[2].0, 3);
        assert!(seen.iter().all(|(_, total, _)| *total == 3));

        let cancel = AtomicBool::new(false);
        let mut collection = PackCollection::new();
        let result = pack.load_all_into(
            &mut collection,
            |done, _, _| {
                if done == 1 {
                    cancel.store(true, Ordering::Relaxed);
                }
            },
            &cancel,
        );
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[test]
    fn test_open_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("pack.xml"),
            r#"<OverlayData><POIs><POI type="a" mapid="1"/></POIs></OverlayData>"#,
        )
        .unwrap();

        let pack = Pack::open(dir.path()).unwrap();
        assert_eq!(pack.load_all().unwrap().pois().len(), 1);

        assert!(matches!(
            Pack::open(dir.path().join("missing")),
            Err(Error::Store(markerpack_store::Error::NotAPack(_)))
        ));
    }
}
