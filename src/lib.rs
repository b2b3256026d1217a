//! Parse Markdown into a tree, rewrite it, query it with MarkdQL, and write it back out.
//!
//! The round trip is the core contract: [`md_elem::elem::Document::parse`] accepts any text (it
//! never fails; unrecognized constructs survive as opaque paragraphs), and
//! [`output::write_md`] serializes the tree back with stable normalization, so building a parsed
//! document is idempotent. In between, [`query::query`] selects sub-trees and the operations on
//! [`md_elem::MdElem`] rewrite them.

pub mod md_elem;
pub mod output;
pub mod query;
mod util;
