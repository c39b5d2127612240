//! Byte stores and resource caching for marker packs.
//!
//! A marker pack is either a plain directory or a zip archive (`.zip`,
//! `.taco`). Both are exposed through the [`DataStore`] trait so the loader
//! never needs to know which one it is reading from:
//!
//! - [`DirectoryStore`] - Files under a directory, indexed once at open
//! - [`ArchiveStore`] - Entries of a zip archive, with pooled handles so
//!   several threads can read at once
//! - [`MemoryStore`] - In-memory files, handy for generated packs and tests
//!
//! Paths inside a pack are case-insensitive and may use either `/` or `\`
//! as a separator, because packs authored on Windows rarely agree with
//! themselves on either.
//!
//! [`PackResourceManager`] sits on top of a store and caches auxiliary
//! binary resources (trail files, textures, icons) by path.

mod archive;
mod directory;
mod error;
mod memory;
mod path;
mod resource;
mod store;

pub use archive::ArchiveStore;
pub use directory::DirectoryStore;
pub use error::{Error, Result};
pub use memory::MemoryStore;
pub use path::normalize_path;
pub use resource::{PackResourceManager, ResourceCacheSettings, ResourceProvider};
pub use store::DataStore;
