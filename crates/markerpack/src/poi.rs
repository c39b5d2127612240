//! Points of interest: markers and trails.

use std::fmt;

use markerpack_trl::{Point3, TrailSection};

use crate::attribute::{AggregatesAttributes, Attribute, AttributeCollection, DerivedValue};
use crate::consts::{ATTR_MAPID, ATTR_TYPE, ELEMENT_POI, ELEMENT_ROUTE, ELEMENT_TRAIL};
use crate::{CategoryId, CategoryTree, MAX_CATEGORY_DEPTH};

/// Map id of a POI without a parsable `mapid`.
pub const UNKNOWN_MAP_ID: i32 = -1;

/// Handle to a POI inside a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoiId(pub(crate) usize);

impl PoiId {
    /// Position of the POI in its collection.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Kind of a POI element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PoiKind {
    Marker,
    Trail,
    Route,
    Other,
}

impl PoiKind {
    /// Kind for an element name.
    pub fn from_element(name: &str) -> Self {
        if name.eq_ignore_ascii_case(ELEMENT_POI) {
            Self::Marker
        } else if name.eq_ignore_ascii_case(ELEMENT_TRAIL) {
            Self::Trail
        } else if name.eq_ignore_ascii_case(ELEMENT_ROUTE) {
            Self::Route
        } else {
            Self::Other
        }
    }

    /// Element name written for this kind, if it has one.
    pub fn element_name(self) -> Option<&'static str> {
        match self {
            Self::Marker => Some(ELEMENT_POI),
            Self::Trail => Some(ELEMENT_TRAIL),
            Self::Route => Some(ELEMENT_ROUTE),
            Self::Other => None,
        }
    }
}

impl fmt::Display for PoiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Marker => "marker",
            Self::Trail => "trail",
            Self::Route => "route",
            Self::Other => "other",
        })
    }
}

/// Geometry of a trail.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trail {
    sections: Vec<TrailSection>,
}

impl Trail {
    pub fn new(sections: Vec<TrailSection>) -> Self {
        Self { sections }
    }

    #[inline]
    pub fn sections(&self) -> &[TrailSection] {
        &self.sections
    }

    /// Every point of every section, in order.
    pub fn points(&self) -> impl Iterator<Item = &Point3> + '_ {
        self.sections.iter().flat_map(|s| s.points())
    }

    /// Total number of points.
    pub fn point_count(&self) -> usize {
        self.sections.iter().map(|s| s.points().len()).sum()
    }
}

/// A marker or trail placed on a map.
#[derive(Debug, Clone)]
pub struct PointOfInterest {
    kind: PoiKind,
    attributes: AttributeCollection,
    category: Option<CategoryId>,
    map_id: i32,
    trail: Option<Trail>,
}

impl PointOfInterest {
    /// Create a POI and resolve its category and map id.
    ///
    /// The `type` attribute names the category as a dotted namespace; the
    /// category is created under the root if it does not exist yet. The
    /// attribute is then replaced by one that always reads the category's
    /// current namespace. A missing or empty `type` leaves the POI without a
    /// category. `mapid` is read after the category is known, so it can be
    /// inherited; it is [`UNKNOWN_MAP_ID`] if missing or not an integer.
    pub fn new(kind: PoiKind, attributes: AttributeCollection, tree: &mut CategoryTree) -> Self {
        let mut poi = Self {
            kind,
            attributes,
            category: None,
            map_id: UNKNOWN_MAP_ID,
            trail: None,
        };

        let namespace = tree
            .aggregated_value(&poi, ATTR_TYPE)
            .map(str::to_string);
        if let Some(namespace) = namespace {
            let depth = namespace.split('.').filter(|s| !s.is_empty()).count();
            if depth > MAX_CATEGORY_DEPTH {
                tracing::warn!(
                    depth,
                    limit = MAX_CATEGORY_DEPTH,
                    "poi type is nested too deeply, leaving it without a category"
                );
                return poi.with_map_id(tree);
            }

            let category = tree.get_or_add(CategoryId::ROOT, &namespace);
            if !category.is_root() {
                poi.category = Some(category);
                poi.attributes
                    .add_or_update(Attribute::derived(ATTR_TYPE, DerivedValue::ParentNamespace));
            }
        }

        poi.with_map_id(tree)
    }

    fn with_map_id(mut self, tree: &CategoryTree) -> Self {
        self.map_id = tree
            .aggregated_value(&self, ATTR_MAPID)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(UNKNOWN_MAP_ID);
        self
    }

    /// Create a trail POI.
    pub fn new_trail(attributes: AttributeCollection, trail: Trail, tree: &mut CategoryTree) -> Self {
        let mut poi = Self::new(PoiKind::Trail, attributes, tree);
        poi.trail = Some(trail);
        poi
    }

    #[inline]
    pub fn kind(&self) -> PoiKind {
        self.kind
    }

    /// Category resolved from `type` at construction.
    #[inline]
    pub fn category(&self) -> Option<CategoryId> {
        self.category
    }

    #[inline]
    pub fn map_id(&self) -> i32 {
        self.map_id
    }

    #[inline]
    pub fn attributes(&self) -> &AttributeCollection {
        &self.attributes
    }

    /// Trail geometry, for trails.
    #[inline]
    pub fn trail(&self) -> Option<&Trail> {
        self.trail.as_ref()
    }
}

impl AggregatesAttributes for PointOfInterest {
    fn explicit_attributes(&self) -> &AttributeCollection {
        &self.attributes
    }

    fn attribute_parent(&self) -> Option<CategoryId> {
        self.category
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> AttributeCollection {
        pairs.iter().map(|&(n, v)| Attribute::new(n, v)).collect()
    }

    #[test]
    fn test_resolves_category_and_map() {
        let mut tree = CategoryTree::new();
        let poi = PointOfInterest::new(
            PoiKind::Marker,
            attrs(&[("type", "tyria.lions arch"), ("mapid", " 50 ")]),
            &mut tree,
        );

        let category = poi.category().unwrap();
        assert_eq!(tree.namespace(category), "tyria.lions_arch");
        assert_eq!(poi.map_id(), 50);
        assert!(poi.attributes().get("type").unwrap().value().is_derived());
        assert_eq!(tree.aggregated_value(&poi, "type"), Some("tyria.lions_arch"));
    }

    #[test]
    fn test_overly_deep_type_gets_no_category() {
        let mut tree = CategoryTree::new();
        let deep = vec!["a"; MAX_CATEGORY_DEPTH + 1].join(".");
        let poi = PointOfInterest::new(
            PoiKind::Marker,
            attrs(&[("type", deep.as_str()), ("mapid", "7")]),
            &mut tree,
        );

        assert!(poi.category().is_none());
        assert!(tree.is_empty());
        assert_eq!(poi.map_id(), 7);

        let limit = vec!["a"; MAX_CATEGORY_DEPTH].join(".");
        let poi = PointOfInterest::new(PoiKind::Marker, attrs(&[("type", limit.as_str())]), &mut tree);
        assert_eq!(tree.depth(poi.category().unwrap()), MAX_CATEGORY_DEPTH);
    }

    #[test]
    fn test_map_id_inherited_from_category() {
        let mut tree = CategoryTree::new();
        let category = tree.get_or_add(CategoryId::ROOT, "a");
        tree[category].attributes_mut().set("mapid", "15");

        let poi = PointOfInterest::new(PoiKind::Marker, attrs(&[("type", "a")]), &mut tree);
        assert_eq!(poi.map_id(), 15);
    }

    #[test]
    fn test_missing_or_bad_values() {
        let mut tree = CategoryTree::new();

        let untyped = PointOfInterest::new(PoiKind::Marker, attrs(&[("mapid", "x")]), &mut tree);
        assert_eq!(untyped.category(), None);
        assert_eq!(untyped.map_id(), UNKNOWN_MAP_ID);

        let empty = PointOfInterest::new(PoiKind::Marker, attrs(&[("type", "..")]), &mut tree);
        assert_eq!(empty.category(), None);
        assert_eq!(empty.attributes().get_static("type"), Some(".."));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_type_follows_category_rename() {
        let mut tree = CategoryTree::new();
        let poi = PointOfInterest::new(PoiKind::Marker, attrs(&[("type", "a.b")]), &mut tree);

        let a = tree.find("a").unwrap();
        tree.rename(a, "c").unwrap();

        assert_eq!(tree.aggregated_value(&poi, "type"), Some("c.b"));
    }

    #[test]
    fn test_kind_from_element() {
        assert_eq!(PoiKind::from_element("POI"), PoiKind::Marker);
        assert_eq!(PoiKind::from_element("trail"), PoiKind::Trail);
        assert_eq!(PoiKind::from_element("route"), PoiKind::Route);
        assert_eq!(PoiKind::from_element("markercategory"), PoiKind::Other);
    }

    #[test]
    fn test_trail_points_concatenate() {
        let trail = Trail::new(vec![
            TrailSection::new(5, vec![Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)]),
            TrailSection::new(5, vec![Point3::new(3.0, 0.0, 0.0)]),
        ]);

        let xs: Vec<f32> = trail.points().map(|p| p.x).collect();
        assert_eq!(xs, vec![1.0, 2.0, 3.0]);
        assert_eq!(trail.point_count(), 3);
    }
}
