//! Conversion of parsed elements into pack entities.
//!
//! - [`category`] - `markercategory` elements into the category tree
//! - [`pathable`] - `poi` / `trail` / `route` elements into POIs

pub mod category;
pub mod pathable;

pub use category::unpack_category;
pub use pathable::unpack_pathable;
