//! Overlay document ingestion.

use std::io::Read;
use std::ops::AddAssign;

use markerpack_store::ResourceProvider;
use markerpack_xml::{ParserSettings, XmlDocument};

use crate::builder::{category, pathable};
use crate::consts::{ELEMENT_MARKERCATEGORY, ELEMENT_OVERLAYDATA, ELEMENT_POIS};
use crate::{CategoryId, CategoryTree, PointOfInterest, Result};

/// Settings for reading overlay documents.
#[derive(Debug, Clone, Default)]
pub struct ReaderSettings {
    pub parser: ParserSettings,
}

impl ReaderSettings {
    /// Strip `prefix` from element and attribute names.
    pub fn with_vendor_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.parser = self.parser.with_vendor_prefix(prefix);
        self
    }

    pub fn with_parser(mut self, parser: ParserSettings) -> Self {
        self.parser = parser;
        self
    }
}

/// What a single populate call added.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopulateStats {
    /// `markercategory` elements applied, nested ones included.
    pub categories: usize,
    /// POIs accepted by the target.
    pub pois: usize,
    /// Elements inside `pois` that produced no POI or were filtered out.
    pub skipped: usize,
}

impl AddAssign for PopulateStats {
    fn add_assign(&mut self, other: Self) {
        self.categories += other.categories;
        self.pois += other.pois;
        self.skipped += other.skipped;
    }
}

/// Something overlay documents can be loaded into.
pub trait PackTarget {
    /// The shared category tree.
    fn categories(&self) -> &CategoryTree;

    fn categories_mut(&mut self) -> &mut CategoryTree;

    /// Offer a POI. Returns `false` if the target rejected it.
    fn add_poi(&mut self, poi: PointOfInterest) -> bool;
}

/// Loads overlay documents into a [`PackTarget`].
///
/// Categories are registered before POIs, so POIs can reference categories
/// defined later in the same document.
pub struct PackReader<'r> {
    resources: &'r dyn ResourceProvider,
    settings: ReaderSettings,
}

impl<'r> PackReader<'r> {
    /// Create a reader that loads trail data from `resources`.
    pub fn new(resources: &'r dyn ResourceProvider) -> Self {
        Self::with_settings(resources, ReaderSettings::default())
    }

    pub fn with_settings(resources: &'r dyn ResourceProvider, settings: ReaderSettings) -> Self {
        Self { resources, settings }
    }

    #[inline]
    pub fn settings(&self) -> &ReaderSettings {
        &self.settings
    }

    /// Parse a document without applying it.
    pub fn parse(&self, text: &str) -> Result<XmlDocument> {
        Ok(XmlDocument::parse_with(text, &self.settings.parser)?)
    }

    /// Parse a document and load it into `target`.
    ///
    /// On a parse error the target is left untouched.
    pub fn populate_from_str<T>(&self, target: &mut T, text: &str) -> Result<PopulateStats>
    where
        T: PackTarget + ?Sized,
    {
        let document = self.parse(text).map_err(|e| {
            tracing::warn!(error = %e, "failed to parse overlay document");
            e
        })?;
        Ok(self.apply(target, &document))
    }

    /// Read a whole document from `reader` and load it into `target`.
    pub fn populate_from_reader<T, R>(&self, target: &mut T, mut reader: R) -> Result<PopulateStats>
    where
        T: PackTarget + ?Sized,
        R: Read,
    {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        self.populate_from_str(target, &String::from_utf8_lossy(&bytes))
    }

    /// Load an already parsed document into `target`.
    pub fn apply<T>(&self, target: &mut T, document: &XmlDocument) -> PopulateStats
    where
        T: PackTarget + ?Sized,
    {
        let root = document.root();
        if !root.is_named(ELEMENT_OVERLAYDATA) {
            tracing::debug!(root = %root.name, "unexpected root element, loading anyway");
        }

        let mut stats = PopulateStats::default();

        for node in root.children_named(ELEMENT_MARKERCATEGORY) {
            category::unpack_counted(
                target.categories_mut(),
                node,
                CategoryId::ROOT,
                &mut stats.categories,
            );
        }

        for pois in root.children_named(ELEMENT_POIS) {
            for node in &pois.children {
                let built = pathable::unpack_pathable(node, self.resources, target.categories_mut());
                if built.is_some_and(|poi| target.add_poi(poi)) {
                    stats.pois += 1;
                } else {
                    stats.skipped += 1;
                }
            }
        }

        tracing::debug!(
            categories = stats.categories,
            pois = stats.pois,
            skipped = stats.skipped,
            "applied overlay document"
        );

        stats
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use markerpack_store::{MemoryStore, PackResourceManager};

    use super::*;
    use crate::{Error, FilteredPackCollection, PackCollection};

    fn resources() -> PackResourceManager {
        PackResourceManager::new(Arc::new(MemoryStore::new("mem")))
    }

    #[test]
    fn test_end_to_end() {
        let resources = resources();
        let reader = PackReader::new(&resources);
        let mut collection = PackCollection::new();

        let stats = reader
            .populate_from_str(
                &mut collection,
                r#"<OverlayData>
                    <MarkerCategory name="foo"/>
                    <POIs><POI type="foo" mapid="7"/></POIs>
                </OverlayData>"#,
            )
            .unwrap();

        assert_eq!(stats, PopulateStats { categories: 1, pois: 1, skipped: 0 });
        assert_eq!(collection.categories().len(), 1);

        let poi = &collection.pois()[0];
        assert_eq!(poi.map_id(), 7);
        let category = poi.category().unwrap();
        assert_eq!(collection.categories().namespace(category), "foo");
        assert_eq!(collection.categories()[category].members().len(), 1);
    }

    #[test]
    fn test_merge_keeps_unset_fields() {
        let resources = resources();
        let reader = PackReader::new(&resources);
        let mut collection = PackCollection::new();

        reader
            .populate_from_str(
                &mut collection,
                r#"<OverlayData><MarkerCategory name="foo" isseparator="1"/></OverlayData>"#,
            )
            .unwrap();
        reader
            .populate_from_str(
                &mut collection,
                r#"<OverlayData><MarkerCategory name="foo" displayname="Foo!"/></OverlayData>"#,
            )
            .unwrap();

        let tree = collection.categories();
        let foo = &tree[tree.find("foo").unwrap()];
        assert!(foo.is_separator());
        assert_eq!(foo.display_name(), "Foo!");
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_parse_failure_leaves_target_untouched() {
        let resources = resources();
        let reader = PackReader::new(&resources);
        let mut collection = PackCollection::new();

        let result = reader.populate_from_str(
            &mut collection,
            r#"<OverlayData><MarkerCategory name="foo"><POIs></OverlayData>"#,
        );

        assert!(matches!(result, Err(Error::Parse(_))));
        assert!(collection.categories().is_empty());
        assert!(collection.pois().is_empty());
    }

    #[test]
    fn test_pois_before_categories_in_document() {
        let resources = resources();
        let reader = PackReader::new(&resources);
        let mut collection = PackCollection::new();

        reader
            .populate_from_str(
                &mut collection,
                r#"<OverlayData>
                    <POIs><POI type="late.child" mapid="1"/><Route type="late"/><Trail type="late"/></POIs>
                    <MarkerCategory name="late" iconsize="2"><MarkerCategory name="child"/></MarkerCategory>
                </OverlayData>"#,
            )
            .map(|stats| assert_eq!(stats.skipped, 2))
            .unwrap();

        let tree = collection.categories();
        let poi = &collection.pois()[0];
        assert!(tree[poi.category().unwrap()].loaded_from_pack());
        assert_eq!(tree.aggregated_value(poi, "iconsize"), Some("2"));
    }

    #[test]
    fn test_rejected_pois_count_as_skipped() {
        let resources = resources();
        let reader = PackReader::new(&resources);
        let mut collection = PackCollection::new();
        let mut filtered =
            FilteredPackCollection::new(&mut collection, |p: &PointOfInterest| p.map_id() == 15);

        let stats = reader
            .populate_from_str(
                &mut filtered,
                r#"<OverlayData><POIs>
                    <POI type="a" mapid="15"/>
                    <POI type="a" mapid="50"/>
                    <Route type="a"/>
                </POIs></OverlayData>"#,
            )
            .unwrap();

        assert_eq!(stats, PopulateStats { categories: 0, pois: 1, skipped: 2 });
        assert_eq!(collection.pois().len(), 1);
    }

    #[test]
    fn test_vendor_prefix() {
        let resources = resources();
        let settings = ReaderSettings::default().with_vendor_prefix("bh-");
        let reader = PackReader::with_settings(&resources, settings);
        let mut collection = PackCollection::new();

        reader
            .populate_from_reader(
                &mut collection,
                r#"<OverlayData><POIs><POI type="a" bh-mapid="3"/></POIs></OverlayData>"#.as_bytes(),
            )
            .unwrap();

        assert_eq!(collection.pois()[0].map_id(), 3);
    }
}
