//! Ordered, case-insensitive attribute collections.
//!
//! Every pack entity (category or POI) carries an [`AttributeCollection`] of
//! the attributes written on its element. Effective values are found by
//! walking up the category tree, see [`CategoryTree::aggregated_value`].
//!
//! [`CategoryTree::aggregated_value`]: crate::CategoryTree::aggregated_value

use markerpack_xml::XmlAttribute;

use crate::{CategoryId, FxHashMap};

/// A value computed from the owning entity when read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerivedValue {
    /// Namespace of the owner's parent category.
    ParentNamespace,
}

/// An attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    /// Text as written in the pack.
    Static(String),
    /// Value resolved against the owner on every read.
    Derived(DerivedValue),
}

impl AttributeValue {
    /// The text of a static value.
    #[inline]
    pub fn as_static(&self) -> Option<&str> {
        match self {
            Self::Static(s) => Some(s),
            Self::Derived(_) => None,
        }
    }

    /// Check if the value is derived.
    #[inline]
    pub fn is_derived(&self) -> bool {
        matches!(self, Self::Derived(_))
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        Self::Static(s)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self::Static(s.to_string())
    }
}

impl From<DerivedValue> for AttributeValue {
    fn from(d: DerivedValue) -> Self {
        Self::Derived(d)
    }
}

/// A named attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    name: String,
    value: AttributeValue,
}

impl Attribute {
    /// Create an attribute.
    pub fn new(name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Create an attribute with a derived value.
    pub fn derived(name: impl Into<String>, value: DerivedValue) -> Self {
        Self::new(name, value)
    }

    /// Attribute name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attribute value.
    #[inline]
    pub fn value(&self) -> &AttributeValue {
        &self.value
    }
}

impl From<&XmlAttribute> for Attribute {
    fn from(attr: &XmlAttribute) -> Self {
        Self::new(attr.name.as_str(), attr.value.as_str())
    }
}

/// Attributes unique by case-insensitive name, kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct AttributeCollection {
    items: Vec<Attribute>,
    /// Lower-cased name -> position in `items`.
    index: FxHashMap<String, usize>,
}

impl AttributeCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection from element attributes. Repeated names keep the
    /// last value.
    pub fn from_xml(attributes: &[XmlAttribute]) -> Self {
        attributes.iter().map(Attribute::from).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add an attribute, replacing any attribute with the same name in place.
    pub fn add_or_update(&mut self, attribute: Attribute) {
        let key = attribute.name.to_lowercase();
        match self.index.get(&key) {
            Some(&pos) => self.items[pos] = attribute,
            None => {
                self.index.insert(key, self.items.len());
                self.items.push(attribute);
            }
        }
    }

    /// Add or update a static attribute.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        self.add_or_update(Attribute::new(name, value));
    }

    /// Add or update every attribute of `other`, in its order.
    pub fn merge(&mut self, other: &AttributeCollection) {
        for attribute in &other.items {
            self.add_or_update(attribute.clone());
        }
    }

    /// Look up an attribute by name.
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.index
            .get(&name.to_lowercase())
            .map(|&pos| &self.items[pos])
    }

    /// Static value of an attribute. Derived values need an owner to
    /// resolve against and return `None` here.
    pub fn get_static(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|a| a.value.as_static())
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&name.to_lowercase())
    }

    /// Remove an attribute, returning it.
    pub fn remove(&mut self, name: &str) -> Option<Attribute> {
        let pos = self.index.remove(&name.to_lowercase())?;
        let removed = self.items.remove(pos);
        for p in self.index.values_mut() {
            if *p > pos {
                *p -= 1;
            }
        }
        Some(removed)
    }

    /// Keep only the attributes matching `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&Attribute) -> bool) {
        self.items.retain(|a| keep(a));
        self.reindex();
    }

    /// Attributes whose name starts with `prefix` (case-insensitive).
    pub fn subset(&self, prefix: &str) -> AttributeCollection {
        let prefix = prefix.to_lowercase();
        self.items
            .iter()
            .filter(|a| a.name.to_lowercase().starts_with(&prefix))
            .cloned()
            .collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.items.iter()
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (pos, attribute) in self.items.iter().enumerate() {
            self.index.insert(attribute.name.to_lowercase(), pos);
        }
    }
}

impl FromIterator<Attribute> for AttributeCollection {
    fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> Self {
        let mut collection = Self::new();
        for attribute in iter {
            collection.add_or_update(attribute);
        }
        collection
    }
}

impl Extend<Attribute> for AttributeCollection {
    fn extend<I: IntoIterator<Item = Attribute>>(&mut self, iter: I) {
        for attribute in iter {
            self.add_or_update(attribute);
        }
    }
}

impl<'a> IntoIterator for &'a AttributeCollection {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// An entity whose effective attributes inherit from a parent category.
pub trait AggregatesAttributes {
    /// Attributes written on the entity itself.
    fn explicit_attributes(&self) -> &AttributeCollection;

    /// Category the entity inherits from, if any.
    fn attribute_parent(&self) -> Option<CategoryId>;
}
