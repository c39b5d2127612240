//! Markerpack - loading, editing and exporting overlay marker packs.
//!
//! A marker pack is a directory or zip archive of overlay documents (an XML
//! dialect describing a tree of categories and the markers and trails placed
//! on game maps) plus binary trail geometry, textures and icons.
//!
//! # Crates
//!
//! - [`markerpack_xml`] - Overlay document parser and writer
//! - [`markerpack_trl`] - Binary trail (`.trl`) reader and encoder
//! - [`markerpack_store`] - Directory, archive and in-memory byte stores,
//!   resource cache
//!
//! # Model
//!
//! Categories live in a [`CategoryTree`] arena and are addressed by
//! [`CategoryId`]. Every category has a dotted namespace (`tyria.hearts`)
//! derived from its ancestry. Attributes not set on an entity are inherited
//! from its category and that category's ancestors; see
//! [`CategoryTree::aggregated_value`]. A POI's `type` attribute is derived
//! from its category, so renaming or moving a category is reflected in every
//! POI that references it.
//!
//! # Example
//!
//! ```no_run
//! use markerpack::prelude::*;
//!
//! let pack = Pack::open("Tyria.taco")?;
//! let collection = pack.load_map(15)?;
//!
//! for poi in collection.pois() {
//!     let icon = collection.categories().aggregated_value(poi, "iconfile");
//!     println!("{} {:?}", poi.kind(), icon);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod attribute;
pub mod builder;
mod category;
mod collection;
pub mod consts;
mod error;
mod modify;
mod pack;
mod poi;
mod reader;
mod writer;

use std::hash::BuildHasherDefault;

use rustc_hash::FxHasher;

pub(crate) type FxHashMap<K, V> = hashbrown::HashMap<K, V, BuildHasherDefault<FxHasher>>;
pub(crate) type FxHashSet<T> = hashbrown::HashSet<T, BuildHasherDefault<FxHasher>>;

// Re-export sub-crates
pub use markerpack_store as store;
pub use markerpack_trl as trl;
pub use markerpack_xml as xml;

pub use attribute::{
    AggregatesAttributes, Attribute, AttributeCollection, AttributeValue, DerivedValue,
};
pub use category::{
    sanitize_name, sanitize_namespace, Category, CategoryId, CategoryTree, Descendants, Parents,
    MAX_CATEGORY_DEPTH,
};
pub use collection::{FilteredPackCollection, PackCollection};
pub use error::{Error, Result};
pub use modify::{PackModifier, ShortenNamespace};
pub use pack::Pack;
pub use poi::{PoiId, PoiKind, PointOfInterest, Trail, UNKNOWN_MAP_ID};
pub use reader::{PackReader, PackTarget, PopulateStats, ReaderSettings};
pub use writer::{categories_document, OutputMethod, PackFile, PackWriter, WriterSettings};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{
        AggregatesAttributes, CategoryId, CategoryTree, Pack, PackCollection, PackModifier,
        PackReader, PackWriter, PoiKind, PointOfInterest, ReaderSettings, ShortenNamespace,
        WriterSettings,
    };
    pub use markerpack_store::{DataStore, ResourceProvider};
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
