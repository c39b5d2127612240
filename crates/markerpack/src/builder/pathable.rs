//! POI element unpacking.

use markerpack_store::ResourceProvider;
use markerpack_trl::TrlFile;
use markerpack_xml::XmlNode;

use crate::consts::{ATTR_MAPID, ATTR_TRAILDATA};
use crate::poi::Trail;
use crate::{AttributeCollection, CategoryTree, PoiKind, PointOfInterest};

/// Build a POI from a child element of `pois`.
///
/// Returns `None` for routes (not supported), unknown elements, and trails
/// whose trail data is missing, unreadable or of an unsupported version.
/// Failures are logged, never raised.
pub fn unpack_pathable(
    node: &XmlNode,
    resources: &dyn ResourceProvider,
    tree: &mut CategoryTree,
) -> Option<PointOfInterest> {
    match PoiKind::from_element(&node.name) {
        PoiKind::Marker => Some(PointOfInterest::new(
            PoiKind::Marker,
            AttributeCollection::from_xml(&node.attributes),
            tree,
        )),
        PoiKind::Trail => unpack_trail(node, resources, tree),
        PoiKind::Route => {
            tracing::debug!("route elements are not supported, skipping");
            None
        }
        PoiKind::Other => {
            tracing::debug!(element = %node.name, "unexpected element inside pois, skipping");
            None
        }
    }
}

fn unpack_trail(
    node: &XmlNode,
    resources: &dyn ResourceProvider,
    tree: &mut CategoryTree,
) -> Option<PointOfInterest> {
    let mut attributes = AttributeCollection::from_xml(&node.attributes);

    let Some(path) = attributes.get_static(ATTR_TRAILDATA).map(str::to_string) else {
        tracing::warn!("trail has no traildata attribute, skipping");
        return None;
    };

    let Some(data) = resources.load_resource(&path) else {
        tracing::warn!(traildata = %path, "trail data not found in pack, skipping");
        return None;
    };

    let trl = TrlFile::new(&data);
    let Some(map_id) = trl.map_id() else {
        tracing::warn!(
            traildata = %path,
            version = trl.header().map(|h| h.version()),
            "trail data is truncated or has an unsupported version, skipping"
        );
        return None;
    };

    // The trail file is authoritative for the map.
    attributes.set(ATTR_MAPID, map_id.to_string());
    let trail = Trail::new(trl.sections().collect());

    Some(PointOfInterest::new_trail(attributes, trail, tree))
}
