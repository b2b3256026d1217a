//! Parsed Markdown nodes (and how to parse them).
//!
//! This module provides the tree for a parsed Markdown document. Its main entry point is
//! [`Document::parse`](elem::Document::parse); the structural rewriting operations live on
//! [`MdElem`] itself.
pub(crate) mod link_ref;
mod parse;
mod table;
mod tree;
mod tree_ops;

pub use tree::*;
