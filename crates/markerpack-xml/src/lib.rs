//! Permissive XML dialect parser for marker pack overlay files.
//!
//! Marker packs are written by hand and by a long tail of third-party tools,
//! so the XML found in the wild is only loosely standard. This crate parses
//! the subset that matters into a plain element tree:
//!
//! - Comments are skipped anywhere whitespace is allowed
//! - `<?...?>` declarations are captured separately from the tree
//! - `<!DOCTYPE ...>` is skipped verbatim
//! - Vendor prefixes on element and attribute names are stripped
//! - All names are lower-cased
//! - Attribute values are entity-decoded, unknown entities are kept as-is
//!
//! A malformed document fails as a whole; a partial tree is never returned.
//!
//! # Example
//!
//! ```
//! use markerpack_xml::{ParserSettings, XmlDocument};
//!
//! let settings = ParserSettings::default().with_vendor_prefix("bh-");
//! let doc = XmlDocument::parse_with(
//!     r#"<OverlayData><MarkerCategory bh-Name="foo" DisplayName="Foo &amp; Bar"/></OverlayData>"#,
//!     &settings,
//! )?;
//!
//! let category = &doc.root().children[0];
//! assert_eq!(category.name, "markercategory");
//! assert_eq!(category.attribute("name"), Some("foo"));
//! assert_eq!(category.attribute("displayname"), Some("Foo & Bar"));
//! # Ok::<(), markerpack_xml::Error>(())
//! ```

mod entity;
mod error;
mod node;
mod parser;
#[cfg(feature = "xml-output")]
mod writer;

pub use entity::decode_entities;
pub use error::{Error, Result};
pub use node::{XmlAttribute, XmlNode};
pub use parser::{ParserSettings, XmlDocument};
