//! Well-known file, element and attribute names.

/// Categories file of an optimized pack.
pub const FILE_OPTIMIZED_CATEGORIES: &str = "_markerCategories.xml";

/// File holding the POIs of one map in an optimized pack.
pub fn optimized_map_file(map_id: i32) -> String {
    format!("map{map_id}.xml")
}

pub const ELEMENT_OVERLAYDATA: &str = "overlaydata";
pub const ELEMENT_MARKERCATEGORY: &str = "markercategory";
pub const ELEMENT_POIS: &str = "pois";
pub const ELEMENT_POI: &str = "poi";
pub const ELEMENT_TRAIL: &str = "trail";
pub const ELEMENT_ROUTE: &str = "route";

pub const ATTR_TYPE: &str = "type";
pub const ATTR_MAPID: &str = "mapid";
pub const ATTR_TRAILDATA: &str = "traildata";
pub const ATTR_TEXTURE: &str = "texture";
pub const ATTR_ICONFILE: &str = "iconfile";

pub const ATTR_NAME: &str = "name";
pub const ATTR_DISPLAYNAME: &str = "displayname";
pub const ATTR_ISSEPARATOR: &str = "isseparator";
pub const ATTR_DEFAULTTOGGLE: &str = "defaulttoggle";
pub const ATTR_ISHIDDEN: &str = "ishidden";

/// Category attributes held as structured fields rather than passthrough
/// attributes.
pub const CATEGORY_STRUCTURED_ATTRS: &[&str] = &[
    ATTR_NAME,
    ATTR_DISPLAYNAME,
    ATTR_ISSEPARATOR,
    ATTR_DEFAULTTOGGLE,
    ATTR_ISHIDDEN,
];

/// Attributes whose values name pack resources copied on export.
pub const RESOURCE_ATTRS: &[&str] = &[ATTR_TEXTURE, ATTR_ICONFILE, ATTR_TRAILDATA];
