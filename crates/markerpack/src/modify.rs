//! In-place pack transformations applied before export.

use crate::{CategoryId, CategoryTree, PackCollection, Result};

/// A transformation of a loaded collection.
pub trait PackModifier {
    fn apply(&self, collection: &mut PackCollection) -> Result<()>;
}

/// Renames every category to a short spreadsheet-column style name
/// (`A`, `B`, .., `Z`, `AA`, ..) by position among its siblings.
///
/// Shorter namespaces make exported map files considerably smaller since
/// every POI repeats its full category path. The old name is kept as the
/// display name unless one was set explicitly. POIs reference their category
/// by handle, so their `type` follows the new namespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortenNamespace;

impl ShortenNamespace {
    /// Short name for the category at `index` among its siblings.
    pub fn short_name(index: usize) -> String {
        let mut name = Vec::new();
        let mut n = index + 1;
        while n > 0 {
            let rem = (n - 1) % 26;
            name.push(b'A' + rem as u8);
            n = (n - 1) / 26;
        }
        name.reverse();
        // Only ASCII letters were pushed.
        name.into_iter().map(char::from).collect()
    }

    fn shorten(tree: &mut CategoryTree) -> Result<()> {
        let mut pending = vec![CategoryId::ROOT];

        while let Some(parent) = pending.pop() {
            let children = tree[parent].children().to_vec();

            for &child in &children {
                let category = &mut tree[child];
                if category.explicit_display_name().is_none() {
                    let old = category.name().to_string();
                    category.set_display_name(old);
                }
            }

            tree.rename_children(parent, Self::short_name)?;
            pending.extend(children);
        }
        Ok(())
    }
}

impl PackModifier for ShortenNamespace {
    fn apply(&self, collection: &mut PackCollection) -> Result<()> {
        let tree = collection.categories_mut();
        let count = tree.len();
        Self::shorten(tree)?;

        tracing::debug!(categories = count, "shortened category namespaces");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Attribute, PoiKind, PointOfInterest};

    #[test]
    fn test_short_name() {
        assert_eq!(ShortenNamespace::short_name(0), "A");
        assert_eq!(ShortenNamespace::short_name(25), "Z");
        assert_eq!(ShortenNamespace::short_name(26), "AA");
        assert_eq!(ShortenNamespace::short_name(27), "AB");
        assert_eq!(ShortenNamespace::short_name(701), "ZZ");
        assert_eq!(ShortenNamespace::short_name(702), "AAA");
    }

    #[test]
    fn test_poi_type_follows_shortened_namespace() {
        let mut collection = PackCollection::new();
        let tree = collection.categories_mut();
        tree.get_or_add(CategoryId::ROOT, "first");
        let labelled = tree.get_or_add(CategoryId::ROOT, "tyria.hearts");
        tree[labelled].set_display_name("Hearts");

        let attributes = [Attribute::new("type", "tyria.hearts")].into_iter().collect();
        let poi = PointOfInterest::new(PoiKind::Marker, attributes, collection.categories_mut());
        let id = collection.push_poi(poi);

        ShortenNamespace.apply(&mut collection).unwrap();

        let tree = collection.categories();
        let poi = collection.poi(id).unwrap();
        assert_eq!(tree.namespace(poi.category().unwrap()), "B.A");
        assert_eq!(tree.aggregated_value(poi, "type"), Some("B.A"));

        let tyria = tree.find("B").unwrap();
        assert_eq!(tree[tyria].display_name(), "tyria");
        assert_eq!(tree[tree.find("B.A").unwrap()].display_name(), "Hearts");
        assert_eq!(tree.find("a").map(|id| tree[id].display_name()), Some("first"));
    }

    #[test]
    fn test_shorten_deep_chain() {
        let mut collection = PackCollection::new();
        let leaf = collection
            .categories_mut()
            .get_or_add(CategoryId::ROOT, &vec!["long_name"; 5_000].join("."));

        ShortenNamespace.apply(&mut collection).unwrap();

        let tree = collection.categories();
        assert_eq!(tree.namespace(leaf), vec!["A"; 5_000].join("."));
        assert_eq!(tree[leaf].display_name(), "long_name");
    }
}
