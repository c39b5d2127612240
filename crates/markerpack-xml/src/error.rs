//! Error types for overlay XML parsing and writing.

use thiserror::Error;

/// Errors that can occur when parsing or writing overlay XML.
///
/// Positions are byte offsets into the source text.
#[derive(Debug, Error)]
pub enum Error {
    /// Input ended in the middle of a construct.
    #[error("unexpected end of input in {context} (at byte {position})")]
    UnexpectedEof {
        context: &'static str,
        position: usize,
    },

    /// A character that cannot start or continue the current construct.
    #[error("unexpected {found:?} at byte {position}, expected {expected}")]
    UnexpectedToken {
        expected: &'static str,
        found: char,
        position: usize,
    },

    /// Attribute value not wrapped in single or double quotes.
    #[error("attribute '{name}' has an unquoted value (at byte {position})")]
    UnquotedAttribute { name: String, position: usize },

    /// Attribute value whose closing quote is missing.
    #[error("attribute '{name}' has an unterminated value (at byte {position})")]
    UnterminatedAttribute { name: String, position: usize },

    /// Comment without a closing `-->`.
    #[error("unterminated comment starting at byte {position}")]
    UnterminatedComment { position: usize },

    /// Element without a closing tag.
    #[error("element <{name}> starting at byte {position} is never closed")]
    UnterminatedElement { name: String, position: usize },

    /// Closing tag that does not match the open element.
    #[error("closing tag </{found}> does not match <{expected}> (at byte {position})")]
    MismatchedClosingTag {
        expected: String,
        found: String,
        position: usize,
    },

    /// Document contains no root element.
    #[error("no root element found")]
    MissingRoot,

    /// Elements nested deeper than the parser allows.
    #[error("elements nested deeper than {depth} levels (at byte {position})")]
    NestingTooDeep { depth: usize, position: usize },

    /// XML writing error.
    #[error("XML error: {0}")]
    Xml(String),
}

/// Result type for overlay XML operations.
pub type Result<T> = std::result::Result<T, Error>;
