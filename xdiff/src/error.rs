//! Error types for the differencing engine.

use thiserror::Error;

/// Result type alias for xdiff operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while parsing or diffing documents.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed input document.
    #[error("parse error: {0}")]
    Parse(String),

    /// Traversal stack limit hit on a pathologically deep tree.
    #[error("maximum tree depth of {0} reached")]
    DepthExceeded(usize),

    /// I/O error while reading sources.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML error from quick-xml.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Downstream writer failed while rendering output.
    #[error("encoder failure: {0}")]
    Encode(#[source] std::io::Error),
}
