//! Reader for marker pack binary trail (`.trl`) files.
//!
//! # File Format
//!
//! All values are little-endian:
//! - 4 bytes: Version (`i32`, only `0` is understood)
//! - 4 bytes: Map ID (`i32`)
//! - N × 12 bytes: Points stored as `(x, z, y)` `f32` triples
//!
//! A triple of exactly `(0, 0, 0)` ends the current section; the points that
//! follow start a new one. Every section carries the header's map ID.
//!
//! Unsupported versions and inputs shorter than the header produce no
//! sections rather than an error, so callers can treat any resource as a
//! potential trail.
//!
//! # Example
//!
//! ```
//! use markerpack_trl::{Point3, TrailSection, TrlFile, TrlHeader};
//!
//! let section = TrailSection::new(15, vec![Point3::new(1.0, 2.0, 3.0)]);
//! let data = markerpack_trl::encode(15, &[section]);
//!
//! // Cheap pre-check without touching the points.
//! assert_eq!(TrlHeader::peek(&data).map(|h| h.map_id()), Some(15));
//!
//! let sections: Vec<_> = TrlFile::new(&data).sections().collect();
//! assert_eq!(sections[0].points(), &[Point3::new(1.0, 2.0, 3.0)]);
//! ```

mod header;
mod reader;
mod section;

pub use header::TrlHeader;
pub use reader::{encode, peek_map_id, Sections, TrlFile};
pub use section::{Point3, TrailSection};
