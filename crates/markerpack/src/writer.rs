//! Optimized pack export.
//!
//! A collection is written back in the optimized layout: every category in
//! `_markerCategories.xml`, the POIs of each map in `map{N}.xml`, plus the
//! textures, icons and trail files the exported POIs reference.

use std::collections::BTreeMap;
use std::fs;
use std::io::{Cursor, Seek, Write};
use std::path::{Path, PathBuf};

use markerpack_store::{normalize_path, ResourceProvider};
use markerpack_xml::{XmlDocument, XmlNode};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::consts::{
    optimized_map_file, ATTR_DEFAULTTOGGLE, ATTR_DISPLAYNAME, ATTR_ISHIDDEN, ATTR_ISSEPARATOR,
    ATTR_MAPID, ATTR_NAME, ATTR_TYPE, ELEMENT_MARKERCATEGORY, ELEMENT_OVERLAYDATA, ELEMENT_POIS,
    FILE_OPTIMIZED_CATEGORIES, RESOURCE_ATTRS,
};
use crate::{
    CategoryId, CategoryTree, Error, FxHashSet, PackCollection, PoiKind, PointOfInterest, Result,
    MAX_CATEGORY_DEPTH,
};

/// How an exported pack is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMethod {
    /// A single zip archive (`.zip` / `.taco`).
    #[default]
    Archive,
    /// A directory of loose files.
    Directory,
}

/// Export options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterSettings {
    pub output: OutputMethod,
    /// Leave `mapid` out of map files. The file name already carries it, but
    /// readers that ignore the layout will lose the map.
    pub skip_map_id: bool,
    pub include_markers: bool,
    pub include_trails: bool,
    pub include_routes: bool,
}

impl Default for WriterSettings {
    fn default() -> Self {
        Self {
            output: OutputMethod::Archive,
            skip_map_id: false,
            include_markers: true,
            include_trails: true,
            include_routes: true,
        }
    }
}

impl WriterSettings {
    pub fn with_output(mut self, output: OutputMethod) -> Self {
        self.output = output;
        self
    }

    pub fn with_skip_map_id(mut self, skip: bool) -> Self {
        self.skip_map_id = skip;
        self
    }

    pub fn with_markers(mut self, include: bool) -> Self {
        self.include_markers = include;
        self
    }

    pub fn with_trails(mut self, include: bool) -> Self {
        self.include_trails = include;
        self
    }

    pub fn with_routes(mut self, include: bool) -> Self {
        self.include_routes = include;
        self
    }
}

/// A file of an exported pack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackFile {
    /// Pack-relative path using `/`.
    pub path: String,
    pub data: Vec<u8>,
}

/// Writes collections in the optimized layout.
#[derive(Debug, Clone, Default)]
pub struct PackWriter {
    settings: WriterSettings,
}

impl PackWriter {
    pub fn new(settings: WriterSettings) -> Self {
        Self { settings }
    }

    #[inline]
    pub fn settings(&self) -> &WriterSettings {
        &self.settings
    }

    fn includes(&self, kind: PoiKind) -> bool {
        match kind {
            PoiKind::Marker => self.settings.include_markers,
            PoiKind::Trail => self.settings.include_trails,
            PoiKind::Route => self.settings.include_routes,
            PoiKind::Other => true,
        }
    }

    /// Build every file of the exported pack in memory.
    ///
    /// Fails with [`Error::Unsupported`] if a route would be written.
    pub fn files(
        &self,
        collection: &PackCollection,
        resources: &dyn ResourceProvider,
    ) -> Result<Vec<PackFile>> {
        let tree = collection.categories();
        let mut files = vec![PackFile {
            path: FILE_OPTIMIZED_CATEGORIES.to_string(),
            data: to_bytes(&categories_document(tree)?)?,
        }];

        let mut exported: Vec<&PointOfInterest> = collection
            .pois()
            .iter()
            .filter(|p| p.category().is_some() && self.includes(p.kind()))
            .collect();
        exported.sort_by_cached_key(|p| p.category().map(|c| tree.namespace(c)));

        let mut by_map: BTreeMap<i32, Vec<&PointOfInterest>> = BTreeMap::new();
        for poi in exported {
            by_map.entry(poi.map_id()).or_default().push(poi);
        }

        for (map_id, pois) in &by_map {
            let document = self.map_document(tree, pois)?;
            files.push(PackFile {
                path: optimized_map_file(*map_id),
                data: to_bytes(&document)?,
            });
        }

        files.extend(self.resource_files(collection, resources));

        tracing::debug!(files = files.len(), maps = by_map.len(), "built pack export");
        Ok(files)
    }

    /// Write the pack into `dir/pack_name` using the configured output
    /// method. `dir` must exist. Returns the path written.
    pub fn write(
        &self,
        collection: &PackCollection,
        resources: &dyn ResourceProvider,
        dir: &Path,
        pack_name: &str,
    ) -> Result<PathBuf> {
        if !dir.is_dir() {
            return Err(markerpack_store::Error::DirectoryNotFound(dir.to_path_buf()).into());
        }

        let target = dir.join(pack_name);
        match self.settings.output {
            OutputMethod::Archive => {
                let file = fs::File::create(&target)?;
                self.write_archive(collection, resources, file)?;
            }
            OutputMethod::Directory => {
                self.write_directory(collection, resources, &target)?;
            }
        }

        tracing::info!(output = %target.display(), "wrote marker pack");
        Ok(target)
    }

    /// Write the pack as loose files under `root`, creating it if needed.
    pub fn write_directory(
        &self,
        collection: &PackCollection,
        resources: &dyn ResourceProvider,
        root: &Path,
    ) -> Result<()> {
        for file in self.files(collection, resources)? {
            let path = root.join(&file.path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, &file.data)?;
        }
        Ok(())
    }

    /// Write the pack as a zip archive into `writer`, returning the writer.
    pub fn write_archive<W: Write + Seek>(
        &self,
        collection: &PackCollection,
        resources: &dyn ResourceProvider,
        writer: W,
    ) -> Result<W> {
        let files = self.files(collection, resources)?;

        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for file in &files {
            zip.start_file(file.path.as_str(), options)?;
            zip.write_all(&file.data)?;
        }

        Ok(zip.finish()?)
    }

    /// Write the pack as an in-memory zip archive.
    pub fn archive_bytes(
        &self,
        collection: &PackCollection,
        resources: &dyn ResourceProvider,
    ) -> Result<Vec<u8>> {
        Ok(self
            .write_archive(collection, resources, Cursor::new(Vec::new()))?
            .into_inner())
    }

    fn map_document(&self, tree: &CategoryTree, pois: &[&PointOfInterest]) -> Result<XmlDocument> {
        let mut container = XmlNode::new(ELEMENT_POIS);
        for poi in pois {
            container.children.push(self.poi_node(tree, poi)?);
        }
        Ok(XmlDocument::new(XmlNode::new(ELEMENT_OVERLAYDATA).child(container)))
    }

    fn poi_node(&self, tree: &CategoryTree, poi: &PointOfInterest) -> Result<XmlNode> {
        let element = match poi.kind() {
            PoiKind::Marker | PoiKind::Trail => poi.kind().element_name(),
            PoiKind::Route | PoiKind::Other => None,
        };
        let Some(element) = element else {
            return Err(Error::Unsupported(format!("exporting {} elements", poi.kind())));
        };

        let namespace = poi.category().map(|c| tree.namespace(c)).unwrap_or_default();
        let mut node = XmlNode::new(element).attr(ATTR_TYPE, namespace);

        for attribute in poi.attributes() {
            let name = attribute.name();
            if name.eq_ignore_ascii_case(ATTR_TYPE)
                || (self.settings.skip_map_id && name.eq_ignore_ascii_case(ATTR_MAPID))
            {
                continue;
            }
            node = node.attr(name, tree.resolve(attribute.value(), poi.category()));
        }

        Ok(node)
    }

    /// Referenced resources that exist in the pack, lower-cased, each once.
    fn resource_files(
        &self,
        collection: &PackCollection,
        resources: &dyn ResourceProvider,
    ) -> Vec<PackFile> {
        let tree = collection.categories();
        let mut seen = FxHashSet::default();
        let mut files = Vec::new();

        for attribute in RESOURCE_ATTRS {
            for poi in collection.pois().iter().filter(|p| self.includes(p.kind())) {
                let Some(path) = tree.aggregated_value(poi, attribute) else {
                    continue;
                };
                let normalized = normalize_path(path);
                if normalized.is_empty() || !seen.insert(normalized.clone()) {
                    continue;
                }

                match resources.load_resource(path) {
                    Some(data) => files.push(PackFile {
                        path: normalized,
                        data: data.to_vec(),
                    }),
                    None => tracing::debug!(resource = path, "referenced resource not in pack"),
                }
            }
        }

        files
    }
}

/// The categories document: every category with its flags and
/// passthrough attributes.
///
/// Fails with [`Error::CategoryTooDeep`] if the tree is nested deeper than
/// [`MAX_CATEGORY_DEPTH`], since such a document could not be read back.
pub fn categories_document(tree: &CategoryTree) -> Result<XmlDocument> {
    if tree.max_depth() > MAX_CATEGORY_DEPTH {
        return Err(Error::CategoryTooDeep {
            limit: MAX_CATEGORY_DEPTH,
        });
    }

    let mut root = XmlNode::new(ELEMENT_OVERLAYDATA);
    for &child in tree[CategoryId::ROOT].children() {
        root.children.push(category_node(tree, child));
    }
    Ok(XmlDocument::new(root))
}

fn category_node(tree: &CategoryTree, id: CategoryId) -> XmlNode {
    let category = &tree[id];
    let mut node = XmlNode::new(ELEMENT_MARKERCATEGORY).attr(ATTR_NAME, category.name());

    if let Some(display_name) = category.explicit_display_name() {
        node = node.attr(ATTR_DISPLAYNAME, display_name);
    }
    if category.is_separator() {
        node = node.attr(ATTR_ISSEPARATOR, "1");
    }
    if !category.default_toggle() {
        node = node.attr(ATTR_DEFAULTTOGGLE, "0");
    }
    if category.is_hidden() {
        node = node.attr(ATTR_ISHIDDEN, "1");
    }
    for attribute in category.attributes() {
        node = node.attr(attribute.name(), tree.resolve(attribute.value(), category.parent()));
    }

    node.children(category.children().iter().map(|&c| category_node(tree, c)))
}

fn to_bytes(document: &XmlDocument) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    document.write_xml(&mut data)?;
    Ok(data)
}
