//! Output `md_elem`s back to Markdown text.
mod fmt_md;
mod json_codec;

pub use crate::output::fmt_md::*;
pub use crate::output::json_codec::*;
