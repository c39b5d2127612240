//! `markercategory` element unpacking.

use markerpack_xml::XmlNode;

use crate::consts::{
    ATTR_DEFAULTTOGGLE, ATTR_DISPLAYNAME, ATTR_ISHIDDEN, ATTR_ISSEPARATOR, ATTR_NAME,
    CATEGORY_STRUCTURED_ATTRS, ELEMENT_MARKERCATEGORY,
};
use crate::{AttributeCollection, CategoryId, CategoryTree};

/// Unpack a `markercategory` element and its nested categories under
/// `parent`.
///
/// The element's `name` is a single segment relative to `parent`; an
/// existing category of that name is extended rather than replaced, and
/// its flags only change when the element sets them. Returns the category,
/// or `None` if the element is not a `markercategory` or has no name.
pub fn unpack_category(
    tree: &mut CategoryTree,
    node: &XmlNode,
    parent: CategoryId,
) -> Option<CategoryId> {
    let mut unpacked = 0;
    unpack_counted(tree, node, parent, &mut unpacked)
}

/// Like [`unpack_category`], counting every category unpacked.
pub(crate) fn unpack_counted(
    tree: &mut CategoryTree,
    node: &XmlNode,
    parent: CategoryId,
    unpacked: &mut usize,
) -> Option<CategoryId> {
    if !node.is_named(ELEMENT_MARKERCATEGORY) {
        tracing::debug!(element = %node.name, "ignoring non-category element inside a category");
        return None;
    }

    let name = match node.attribute(ATTR_NAME) {
        Some(name) if !name.is_empty() => name,
        _ => {
            tracing::warn!(
                parent = tree.namespace(parent),
                "skipping markercategory without a name"
            );
            return None;
        }
    };

    let id = tree.get_or_add_child(parent, name);
    let category = &mut tree[id];
    category.set_loaded_from_pack(true);

    if let Some(display_name) = node.attribute(ATTR_DISPLAYNAME) {
        category.set_display_name(display_name);
    }
    if let Some(value) = node.attribute(ATTR_ISSEPARATOR) {
        category.set_separator(value == "1");
    }
    if let Some(value) = node.attribute(ATTR_DEFAULTTOGGLE) {
        category.set_default_toggle(value != "0");
    }
    if let Some(value) = node.attribute(ATTR_ISHIDDEN) {
        category.set_hidden(value != "0");
    }

    let mut passthrough = AttributeCollection::from_xml(&node.attributes);
    passthrough.retain(|a| {
        !CATEGORY_STRUCTURED_ATTRS
            .iter()
            .any(|s| a.name().eq_ignore_ascii_case(s))
    });
    category.attributes_mut().merge(&passthrough);
    *unpacked += 1;

    for child in &node.children {
        unpack_counted(tree, child, id, unpacked);
    }

    Some(id)
}

#[cfg(test)]
mod tests {
    use markerpack_xml::XmlDocument;

    use super::*;

    fn unpack_all(tree: &mut CategoryTree, xml: &str) {
        let doc = XmlDocument::parse(xml).unwrap();
        for node in doc.root().children_named(ELEMENT_MARKERCATEGORY) {
            unpack_category(tree, node, CategoryId::ROOT);
        }
    }

    #[test]
    fn test_nested_categories() {
        let mut tree = CategoryTree::new();
        unpack_all(
            &mut tree,
            r#"<OverlayData>
                <MarkerCategory name="Tyria" DisplayName="Central Tyria" iconFile="a.png">
                    <MarkerCategory name="Lion's Arch" isSeparator="1"/>
                </MarkerCategory>
            </OverlayData>"#,
        );

        let tyria = tree.find("tyria").unwrap();
        assert_eq!(tree[tyria].display_name(), "Central Tyria");
        assert!(tree[tyria].loaded_from_pack());
        assert_eq!(tree[tyria].attributes().get_static("iconfile"), Some("a.png"));
        assert!(!tree[tyria].attributes().contains("name"));
        assert!(!tree[tyria].attributes().contains("displayname"));

        let arch = tree.find("Tyria.Lion_s_Arch").unwrap();
        assert!(tree[arch].is_separator());
        assert!(tree[arch].default_toggle());
        assert_eq!(tree[arch].display_name(), "Lion_s_Arch");
        assert!(tree[arch].attributes().is_empty());
    }

    #[test]
    fn test_merge_only_touches_present_fields() {
        let mut tree = CategoryTree::new();
        unpack_all(
            &mut tree,
            r#"<OverlayData><MarkerCategory name="foo" isseparator="1" defaulttoggle="0" ishidden="1" texture="a.png"/></OverlayData>"#,
        );
        unpack_all(
            &mut tree,
            r#"<OverlayData><MarkerCategory name="FOO" displayname="Foo!" texture="b.png"/></OverlayData>"#,
        );

        assert_eq!(tree.len(), 1);
        let foo = &tree[tree.find("foo").unwrap()];
        assert_eq!(foo.display_name(), "Foo!");
        assert!(foo.is_separator());
        assert!(!foo.default_toggle());
        assert!(foo.is_hidden());
        assert_eq!(foo.attributes().get_static("texture"), Some("b.png"));
    }

    #[test]
    fn test_flag_values() {
        let mut tree = CategoryTree::new();
        unpack_all(
            &mut tree,
            r#"<OverlayData>
                <MarkerCategory name="a" isseparator="true" defaulttoggle="false" ishidden="0"/>
            </OverlayData>"#,
        );

        let a = &tree[tree.find("a").unwrap()];
        assert!(!a.is_separator());
        assert!(a.default_toggle());
        assert!(!a.is_hidden());
    }

    #[test]
    fn test_nameless_category_skips_subtree() {
        let mut tree = CategoryTree::new();
        unpack_all(
            &mut tree,
            r#"<OverlayData>
                <MarkerCategory displayname="nameless"><MarkerCategory name="lost"/></MarkerCategory>
                <MarkerCategory name=""/>
                <MarkerCategory name="kept"><poi type="x"/></MarkerCategory>
            </OverlayData>"#,
        );

        assert_eq!(tree.len(), 1);
        assert!(tree.find("kept").is_some());
        assert!(tree.find("lost").is_none());
    }

    #[test]
    fn test_dotted_name_is_one_segment() {
        let mut tree = CategoryTree::new();
        let node = XmlNode::new("markercategory").attr("name", "a.b");

        let id = unpack_category(&mut tree, &node, CategoryId::ROOT).unwrap();
        assert_eq!(tree.namespace(id), "a_b");
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_counts_nested() {
        let mut tree = CategoryTree::new();
        let node = XmlNode::new("markercategory")
            .attr("name", "a")
            .child(XmlNode::new("markercategory").attr("name", "b"))
            .child(XmlNode::new("markercategory").attr("name", "c"));

        let mut unpacked = 0;
        unpack_counted(&mut tree, &node, CategoryId::ROOT, &mut unpacked);
        assert_eq!(unpacked, 3);
    }
}
