//! Error types for pack loading and export.

use thiserror::Error;

use crate::CategoryId;

/// Errors that can occur when loading, editing or exporting a marker pack.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Overlay document could not be parsed.
    #[error("parse error: {0}")]
    Parse(#[from] markerpack_xml::Error),

    /// Pack store error.
    #[error("store error: {0}")]
    Store(#[from] markerpack_store::Error),

    /// Zip archive error while exporting.
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Category handle does not belong to this tree.
    #[error("unknown category {0}")]
    UnknownCategory(CategoryId),

    /// The root category cannot be moved or renamed.
    #[error("the root category cannot be moved or renamed")]
    RootCategory,

    /// Reparenting would make a category its own ancestor.
    #[error("cannot move '{category}' under its own descendant '{parent}'")]
    CategoryCycle { category: String, parent: String },

    /// A sibling with the same name already exists.
    #[error("category '{name}' already exists under '{parent}'")]
    DuplicateCategory { name: String, parent: String },

    /// Categories nested deeper than the tree allows.
    #[error("categories nested deeper than {limit} levels")]
    CategoryTooDeep { limit: usize },

    /// Category name is empty.
    #[error("category name must not be empty")]
    EmptyCategoryName,

    /// Operation not supported for this content.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Loading was cancelled by the caller.
    #[error("loading was cancelled")]
    Cancelled,
}

/// Result type for pack operations.
pub type Result<T> = std::result::Result<T, Error>;
