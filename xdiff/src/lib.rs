//! X-Diff: minimum-cost edit scripts between XML documents.
//!
//! Two documents (or two directory trees of documents) are parsed into node
//! trees, every node gets a structural signature and a subtree hash, and a
//! minimum-cost matching between the trees is turned into an ordered list of
//! insert, update and delete operations.
//!
//! Sibling order carries no meaning: the documents are compared as unordered
//! trees, which detects structural changes more accurately than ordered
//! differencing at the price of a harder matching problem. Matching is kept
//! tractable by only pairing nodes whose signatures agree.
//!
//! # Example
//!
//! ```
//! use xdiff::{compare, Parser};
//!
//! let parser = Parser::new();
//! let mut left = parser.parse_str("<root>value</root>")?;
//! let mut right = parser.parse_str("<root>edited</root>")?;
//! let deltas = compare(&mut left, &mut right)?;
//! assert_eq!(deltas.len(), 1);
//! # Ok::<(), xdiff::Error>(())
//! ```

pub mod diff;
pub mod error;
pub mod parser;
pub mod tree;

// Re-export commonly used types
pub use diff::{compare, Delta, DistTable, Encoder, MinCostMatch, Operation, PlainTextEncoder};
pub use error::{Error, Result};
pub use parser::Parser;
pub use tree::{prepare, Node, NodeId, NodeType, Tree};
