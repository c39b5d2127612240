//! Loaded pack content.

use crate::reader::PackTarget;
use crate::{CategoryId, CategoryTree, PoiId, PointOfInterest};

/// A category tree plus the POIs loaded into it.
///
/// Loading several documents into one collection merges them: categories
/// merge by namespace and POIs are appended.
#[derive(Debug, Default)]
pub struct PackCollection {
    categories: CategoryTree,
    pois: Vec<PointOfInterest>,
}

impl PackCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn categories(&self) -> &CategoryTree {
        &self.categories
    }

    #[inline]
    pub fn categories_mut(&mut self) -> &mut CategoryTree {
        &mut self.categories
    }

    /// Every POI in load order.
    #[inline]
    pub fn pois(&self) -> &[PointOfInterest] {
        &self.pois
    }

    #[inline]
    pub fn poi(&self, id: PoiId) -> Option<&PointOfInterest> {
        self.pois.get(id.index())
    }

    /// Append a POI and register it with its category.
    pub fn push_poi(&mut self, poi: PointOfInterest) -> PoiId {
        let id = PoiId(self.pois.len());
        if let Some(category) = poi.category() {
            self.categories.add_member(category, id);
        }
        self.pois.push(poi);
        id
    }

    /// POIs registered in `category`.
    pub fn members(&self, category: CategoryId) -> impl Iterator<Item = &PointOfInterest> + '_ {
        self.categories
            .get(category)
            .map(|c| c.members())
            .unwrap_or_default()
            .iter()
            .filter_map(|&id| self.poi(id))
    }

    /// POIs placed on `map_id`.
    pub fn pois_on_map(&self, map_id: i32) -> impl Iterator<Item = &PointOfInterest> + '_ {
        self.pois.iter().filter(move |p| p.map_id() == map_id)
    }

    /// Distinct map ids, ascending.
    pub fn map_ids(&self) -> Vec<i32> {
        let mut ids: Vec<i32> = self.pois.iter().map(PointOfInterest::map_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

impl PackTarget for PackCollection {
    fn categories(&self) -> &CategoryTree {
        &self.categories
    }

    fn categories_mut(&mut self) -> &mut CategoryTree {
        &mut self.categories
    }

    fn add_poi(&mut self, poi: PointOfInterest) -> bool {
        self.push_poi(poi);
        true
    }
}

/// A view over another target that only lets matching POIs through.
///
/// Categories are shared with the backing target and never filtered.
pub struct FilteredPackCollection<'a, T: PackTarget + ?Sized, F> {
    backing: &'a mut T,
    filter: F,
}

impl<'a, T, F> FilteredPackCollection<'a, T, F>
where
    T: PackTarget + ?Sized,
    F: FnMut(&PointOfInterest) -> bool,
{
    pub fn new(backing: &'a mut T, filter: F) -> Self {
        Self { backing, filter }
    }

    /// The backing target.
    #[inline]
    pub fn backing(&self) -> &T {
        self.backing
    }
}

impl<T, F> PackTarget for FilteredPackCollection<'_, T, F>
where
    T: PackTarget + ?Sized,
    F: FnMut(&PointOfInterest) -> bool,
{
    fn categories(&self) -> &CategoryTree {
        self.backing.categories()
    }

    fn categories_mut(&mut self) -> &mut CategoryTree {
        self.backing.categories_mut()
    }

    fn add_poi(&mut self, poi: PointOfInterest) -> bool {
        if (self.filter)(&poi) {
            self.backing.add_poi(poi)
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Attribute, AttributeCollection, PoiKind};

    fn marker(tree: &mut CategoryTree, category: &str, map_id: i32) -> PointOfInterest {
        let attributes: AttributeCollection = [
            Attribute::new("type", category),
            Attribute::new("mapid", map_id.to_string()),
        ]
        .into_iter()
        .collect();
        PointOfInterest::new(PoiKind::Marker, attributes, tree)
    }

    #[test]
    fn test_push_registers_membership() {
        let mut collection = PackCollection::new();
        let poi = marker(collection.categories_mut(), "a.b", 15);
        let id = collection.push_poi(poi);

        let b = collection.categories().find("a.b").unwrap();
        assert_eq!(collection.categories()[b].members(), &[id]);
        assert_eq!(collection.members(b).count(), 1);
        assert_eq!(collection.members(CategoryId::ROOT).count(), 0);
    }

    #[test]
    fn test_filtered_view_only_filters_pois() {
        let mut collection = PackCollection::new();
        {
            let mut filtered = FilteredPackCollection::new(&mut collection, |p: &PointOfInterest| {
                p.map_id() == 15
            });
            let keep = marker(filtered.categories_mut(), "kept", 15);
            let drop = marker(filtered.categories_mut(), "dropped", 50);

            assert!(filtered.add_poi(keep));
            assert!(!filtered.add_poi(drop));
            assert_eq!(filtered.backing().pois().len(), 1);
        }

        assert_eq!(collection.pois().len(), 1);
        assert_eq!(collection.categories().len(), 2);

        let dropped = collection.categories().find("dropped").unwrap();
        assert!(collection.categories()[dropped].members().is_empty());
    }

    #[test]
    fn test_map_ids() {
        let mut collection = PackCollection::new();
        for map in [50, 15, 50, -1] {
            let poi = marker(collection.categories_mut(), "a", map);
            collection.push_poi(poi);
        }

        assert_eq!(collection.map_ids(), vec![-1, 15, 50]);
        assert_eq!(collection.pois_on_map(50).count(), 2);
    }
}
