//! Category namespace tree.
//!
//! Categories live in an arena owned by [`CategoryTree`] and refer to each
//! other through [`CategoryId`] handles. Handle `0` is the unnamed root.
//!
//! Each category caches its dotted namespace (`a.b.c`). Any change to the
//! shape of the tree (rename, reparent) clears the cache of the affected
//! category and all of its descendants, so a namespace read never sees a
//! stale ancestor name.

use std::borrow::Cow;
use std::fmt;
use std::sync::OnceLock;

use crate::attribute::{AggregatesAttributes, AttributeCollection, AttributeValue, DerivedValue};
use crate::{Attribute, Error, FxHashMap, PoiId, Result};

/// Deepest category nesting accepted from pack content and kept on export.
pub const MAX_CATEGORY_DEPTH: usize = 128;

/// Handle to a category inside a [`CategoryTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CategoryId(u32);

impl CategoryId {
    /// The root category.
    pub const ROOT: Self = Self(0);

    #[inline]
    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Replace every character that is not alphanumeric with `_`.
pub fn sanitize_name(name: &str) -> Cow<'_, str> {
    if name.chars().all(char::is_alphanumeric) {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(
            name.chars()
                .map(|c| if c.is_alphanumeric() { c } else { '_' })
                .collect(),
        )
    }
}

/// Sanitize every segment of a dotted path, dropping empty segments.
pub fn sanitize_namespace(path: &str) -> String {
    path.split('.')
        .filter(|s| !s.is_empty())
        .map(sanitize_name)
        .collect::<Vec<_>>()
        .join(".")
}

/// A node of the category tree.
#[derive(Debug)]
pub struct Category {
    name: String,
    display_name: Option<String>,
    parent: Option<CategoryId>,
    children: Vec<CategoryId>,
    /// Lower-cased child name -> position in `children`.
    child_index: FxHashMap<String, usize>,
    is_separator: bool,
    default_toggle: bool,
    is_hidden: bool,
    loaded_from_pack: bool,
    attributes: AttributeCollection,
    namespace: OnceLock<String>,
    members: Vec<PoiId>,
}

impl Category {
    fn new(name: String, parent: Option<CategoryId>) -> Self {
        Self {
            name,
            display_name: None,
            parent,
            children: Vec::new(),
            child_index: FxHashMap::default(),
            is_separator: false,
            default_toggle: true,
            is_hidden: false,
            loaded_from_pack: false,
            attributes: AttributeCollection::new(),
            namespace: OnceLock::new(),
            members: Vec::new(),
        }
    }

    /// Sanitized name, empty for the root.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display name, defaulting to the name.
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Display name if one was set explicitly.
    #[inline]
    pub fn explicit_display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn set_display_name(&mut self, display_name: impl Into<String>) {
        self.display_name = Some(display_name.into());
    }

    #[inline]
    pub fn parent(&self) -> Option<CategoryId> {
        self.parent
    }

    /// Direct children in insertion order.
    #[inline]
    pub fn children(&self) -> &[CategoryId] {
        &self.children
    }

    #[inline]
    pub fn is_separator(&self) -> bool {
        self.is_separator
    }

    pub fn set_separator(&mut self, value: bool) {
        self.is_separator = value;
    }

    #[inline]
    pub fn default_toggle(&self) -> bool {
        self.default_toggle
    }

    pub fn set_default_toggle(&mut self, value: bool) {
        self.default_toggle = value;
    }

    #[inline]
    pub fn is_hidden(&self) -> bool {
        self.is_hidden
    }

    pub fn set_hidden(&mut self, value: bool) {
        self.is_hidden = value;
    }

    /// Whether a `markercategory` element defined this category, as opposed
    /// to it being created implicitly by a POI `type`.
    #[inline]
    pub fn loaded_from_pack(&self) -> bool {
        self.loaded_from_pack
    }

    pub fn set_loaded_from_pack(&mut self, value: bool) {
        self.loaded_from_pack = value;
    }

    #[inline]
    pub fn attributes(&self) -> &AttributeCollection {
        &self.attributes
    }

    #[inline]
    pub fn attributes_mut(&mut self) -> &mut AttributeCollection {
        &mut self.attributes
    }

    /// POIs registered in this category.
    #[inline]
    pub fn members(&self) -> &[PoiId] {
        &self.members
    }

    fn find_child(&self, name: &str) -> Option<CategoryId> {
        self.child_index
            .get(&name.to_lowercase())
            .map(|&pos| self.children[pos])
    }

    fn push_child(&mut self, name: &str, id: CategoryId) {
        self.child_index.insert(name.to_lowercase(), self.children.len());
        self.children.push(id);
    }

    fn remove_child(&mut self, id: CategoryId) {
        let Some(pos) = self.children.iter().position(|&c| c == id) else {
            return;
        };
        self.children.remove(pos);
        self.child_index.retain(|_, p| *p != pos);
        for p in self.child_index.values_mut() {
            if *p > pos {
                *p -= 1;
            }
        }
    }
}

impl AggregatesAttributes for Category {
    fn explicit_attributes(&self) -> &AttributeCollection {
        &self.attributes
    }

    fn attribute_parent(&self) -> Option<CategoryId> {
        self.parent
    }
}

/// Arena of categories rooted at [`CategoryId::ROOT`].
#[derive(Debug)]
pub struct CategoryTree {
    categories: Vec<Category>,
}

impl Default for CategoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl CategoryTree {
    /// Create a tree holding only the root.
    pub fn new() -> Self {
        Self {
            categories: vec![Category::new(String::new(), None)],
        }
    }

    #[inline]
    pub fn root(&self) -> CategoryId {
        CategoryId::ROOT
    }

    /// Number of categories, not counting the root.
    #[inline]
    pub fn len(&self) -> usize {
        self.categories.len() - 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn get(&self, id: CategoryId) -> Option<&Category> {
        self.categories.get(id.index())
    }

    #[inline]
    pub fn get_mut(&mut self, id: CategoryId) -> Option<&mut Category> {
        self.categories.get_mut(id.index())
    }

    fn node(&self, id: CategoryId) -> Result<&Category> {
        self.get(id).ok_or(Error::UnknownCategory(id))
    }

    /// Direct child of `parent` with the given (unsanitized) name.
    pub fn child(&self, parent: CategoryId, name: &str) -> Option<CategoryId> {
        self.get(parent)?.find_child(&sanitize_name(name))
    }

    /// Find or create a direct child of `parent`. The name is sanitized.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is not a handle of this tree.
    pub fn get_or_add_child(&mut self, parent: CategoryId, name: &str) -> CategoryId {
        let name = sanitize_name(name);
        if let Some(existing) = self.categories[parent.index()].find_child(&name) {
            return existing;
        }

        let id = CategoryId(self.categories.len() as u32);
        self.categories.push(Category::new(name.to_string(), Some(parent)));
        self.categories[parent.index()].push_child(&name, id);
        id
    }

    /// Walk a dotted path below `scope`, creating missing segments.
    ///
    /// Empty segments are skipped; an empty path returns `scope`.
    pub fn get_or_add(&mut self, scope: CategoryId, path: &str) -> CategoryId {
        path.split('.')
            .filter(|s| !s.is_empty())
            .fold(scope, |current, segment| self.get_or_add_child(current, segment))
    }

    /// Walk a dotted path below `scope` without creating anything.
    pub fn try_get(&self, scope: CategoryId, path: &str) -> Option<CategoryId> {
        self.get(scope)?;
        path.split('.')
            .filter(|s| !s.is_empty())
            .try_fold(scope, |current, segment| self.child(current, segment))
    }

    /// Look up a category by its full namespace.
    pub fn find(&self, namespace: &str) -> Option<CategoryId> {
        self.try_get(CategoryId::ROOT, namespace)
    }

    /// Dotted namespace of a category, empty for the root.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a handle of this tree.
    pub fn namespace(&self, id: CategoryId) -> &str {
        let category = &self.categories[id.index()];
        category.namespace.get_or_init(|| {
            // Names up to the nearest ancestor with a cached namespace.
            let mut names = Vec::new();
            let mut prefix = "";
            let mut current = id;
            while !current.is_root() {
                let node = &self.categories[current.index()];
                if current != id {
                    if let Some(cached) = node.namespace.get() {
                        prefix = cached;
                        break;
                    }
                }
                names.push(node.name.as_str());
                current = node.parent.unwrap_or(CategoryId::ROOT);
            }

            let mut namespace = String::from(prefix);
            for name in names.iter().rev() {
                if !namespace.is_empty() {
                    namespace.push('.');
                }
                namespace.push_str(name);
            }
            namespace
        })
    }

    /// Number of categories from the root down to `id`, so a top-level
    /// category has depth 1 and the root 0.
    pub fn depth(&self, id: CategoryId) -> usize {
        self.parents(id).count()
    }

    /// Depth of the deepest category in the tree.
    pub fn max_depth(&self) -> usize {
        self.height(CategoryId::ROOT)
    }

    /// Levels below `id`, zero for a leaf.
    fn height(&self, id: CategoryId) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(id, 0usize)];
        while let Some((current, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(
                self.categories[current.index()]
                    .children
                    .iter()
                    .map(|&child| (child, depth + 1)),
            );
        }
        deepest
    }

    /// Ancestors of `id`, nearest first, starting with `id` itself and
    /// stopping before the root.
    pub fn parents(&self, id: CategoryId) -> Parents<'_> {
        Parents {
            tree: self,
            next: Some(id).filter(|id| !id.is_root() && self.get(*id).is_some()),
        }
    }

    /// Every category below `id` in depth-first document order, not
    /// including `id`.
    pub fn descendants(&self, id: CategoryId) -> Descendants<'_> {
        let stack: Vec<CategoryId> = self
            .get(id)
            .map(|c| c.children.iter().rev().copied().collect())
            .unwrap_or_default();
        Descendants { tree: self, stack }
    }

    /// Every non-root category in depth-first document order.
    pub fn iter(&self) -> Descendants<'_> {
        self.descendants(CategoryId::ROOT)
    }

    /// Move a category under a new parent.
    ///
    /// Does nothing if the parent is unchanged. Fails for the root, for a
    /// parent that is the category itself or one of its descendants, and
    /// when the new parent already has a child of the same name.
    pub fn set_parent(&mut self, id: CategoryId, new_parent: CategoryId) -> Result<()> {
        if id.is_root() {
            return Err(Error::RootCategory);
        }
        let current = self.node(id)?.parent;
        self.node(new_parent)?;

        if current == Some(new_parent) {
            return Ok(());
        }

        if new_parent == id || self.parents(new_parent).any(|a| a == id) {
            return Err(Error::CategoryCycle {
                category: self.namespace(id).to_string(),
                parent: self.namespace(new_parent).to_string(),
            });
        }

        let depth = self.depth(new_parent) + 1 + self.height(id);
        if depth > MAX_CATEGORY_DEPTH {
            return Err(Error::CategoryTooDeep {
                limit: MAX_CATEGORY_DEPTH,
            });
        }

        let name = self.categories[id.index()].name.clone();
        if self.categories[new_parent.index()].find_child(&name).is_some() {
            return Err(Error::DuplicateCategory {
                name,
                parent: self.namespace(new_parent).to_string(),
            });
        }

        if let Some(old) = current {
            self.categories[old.index()].remove_child(id);
        }
        self.categories[new_parent.index()].push_child(&name, id);
        self.categories[id.index()].parent = Some(new_parent);

        self.invalidate_namespaces(id);
        Ok(())
    }

    /// Rename a category. The name is sanitized.
    pub fn rename(&mut self, id: CategoryId, name: &str) -> Result<()> {
        if id.is_root() {
            return Err(Error::RootCategory);
        }
        if name.is_empty() {
            return Err(Error::EmptyCategoryName);
        }
        let parent = self.node(id)?.parent.unwrap_or(CategoryId::ROOT);
        let name = sanitize_name(name).into_owned();

        if let Some(existing) = self.categories[parent.index()].find_child(&name) {
            if existing != id {
                return Err(Error::DuplicateCategory {
                    name,
                    parent: self.namespace(parent).to_string(),
                });
            }
        }

        let old_key = self.categories[id.index()].name.to_lowercase();
        let siblings = &mut self.categories[parent.index()].child_index;
        if let Some(pos) = siblings.remove(&old_key) {
            siblings.insert(name.to_lowercase(), pos);
        }

        self.categories[id.index()].name = name;
        self.invalidate_namespaces(id);
        Ok(())
    }

    /// Rename every direct child of `parent` at once, using `name_for` to
    /// pick a name from each child's position.
    ///
    /// Names only need to be unique among the new names, so siblings can
    /// swap names. Nothing is changed when the new names collide.
    pub fn rename_children(
        &mut self,
        parent: CategoryId,
        mut name_for: impl FnMut(usize) -> String,
    ) -> Result<()> {
        let children = self.node(parent)?.children.clone();

        let mut names = Vec::with_capacity(children.len());
        let mut index = FxHashMap::default();
        for pos in 0..children.len() {
            let name = sanitize_name(&name_for(pos)).into_owned();
            if name.is_empty() {
                return Err(Error::EmptyCategoryName);
            }
            if index.insert(name.to_lowercase(), pos).is_some() {
                return Err(Error::DuplicateCategory {
                    name,
                    parent: self.namespace(parent).to_string(),
                });
            }
            names.push(name);
        }

        for (&child, name) in children.iter().zip(names) {
            self.categories[child.index()].name = name;
            self.invalidate_namespaces(child);
        }
        self.categories[parent.index()].child_index = index;
        Ok(())
    }

    /// Clear the cached namespace of `id` and every descendant.
    fn invalidate_namespaces(&mut self, id: CategoryId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let category = &mut self.categories[current.index()];
            category.namespace.take();
            stack.extend_from_slice(&category.children);
        }
    }

    pub(crate) fn add_member(&mut self, id: CategoryId, poi: PoiId) {
        if let Some(category) = self.get_mut(id) {
            category.members.push(poi);
        }
    }

    /// Effective value of an attribute for `owner`.
    ///
    /// Returns the owner's explicit value if present, otherwise the first
    /// value found walking up its category ancestry. Derived values are
    /// resolved against the entity that holds them.
    pub fn aggregated_value<'a, O>(&'a self, owner: &'a O, name: &str) -> Option<&'a str>
    where
        O: AggregatesAttributes + ?Sized,
    {
        let mut attributes = owner.explicit_attributes();
        let mut parent = owner.attribute_parent();

        loop {
            if let Some(attribute) = attributes.get(name) {
                return Some(self.resolve(attribute.value(), parent));
            }
            let category = self.get(parent?)?;
            attributes = &category.attributes;
            parent = category.parent;
        }
    }

    /// Every effective attribute of `owner`, with derived values resolved.
    ///
    /// Inherited attributes come first in ancestor order; the owner's own
    /// values replace inherited ones in place.
    pub fn aggregated_all<O>(&self, owner: &O) -> AttributeCollection
    where
        O: AggregatesAttributes + ?Sized,
    {
        let mut chain = vec![(owner.explicit_attributes(), owner.attribute_parent())];
        let mut next = owner.attribute_parent();
        while let Some(category) = next.and_then(|id| self.get(id)) {
            chain.push((&category.attributes, category.parent));
            next = category.parent;
        }

        let mut aggregated = AttributeCollection::new();
        for (attributes, parent) in chain.into_iter().rev() {
            for attribute in attributes {
                let value = self.resolve(attribute.value(), parent);
                aggregated.add_or_update(Attribute::new(attribute.name(), value));
            }
        }
        aggregated
    }

    /// Text of a value held by an entity whose parent is `parent`.
    pub fn resolve<'a>(&'a self, value: &'a AttributeValue, parent: Option<CategoryId>) -> &'a str {
        match value {
            AttributeValue::Static(text) => text.as_str(),
            AttributeValue::Derived(DerivedValue::ParentNamespace) => match parent {
                Some(parent) if self.get(parent).is_some() => self.namespace(parent),
                _ => "",
            },
        }
    }
}

impl std::ops::Index<CategoryId> for CategoryTree {
    type Output = Category;

    fn index(&self, id: CategoryId) -> &Category {
        &self.categories[id.index()]
    }
}

impl std::ops::IndexMut<CategoryId> for CategoryTree {
    fn index_mut(&mut self, id: CategoryId) -> &mut Category {
        &mut self.categories[id.index()]
    }
}

/// Iterator over a category and its ancestors.
pub struct Parents<'a> {
    tree: &'a CategoryTree,
    next: Option<CategoryId>,
}

impl Iterator for Parents<'_> {
    type Item = CategoryId;

    fn next(&mut self) -> Option<CategoryId> {
        let current = self.next?;
        self.next = self.tree[current].parent.filter(|p| !p.is_root());
        Some(current)
    }
}

/// Depth-first iterator over a subtree.
pub struct Descendants<'a> {
    tree: &'a CategoryTree,
    stack: Vec<CategoryId>,
}

impl Iterator for Descendants<'_> {
    type Item = CategoryId;

    fn next(&mut self) -> Option<CategoryId> {
        let current = self.stack.pop()?;
        self.stack
            .extend(self.tree[current].children.iter().rev().copied());
        Some(current)
    }
}
