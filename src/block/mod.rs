//! Block-level parsing.
//!
//! The block parser is line-oriented and incrementally builds the block
//! tree: block quotes, lists and items, headings, thematic breaks, code
//! blocks, HTML blocks, and paragraphs. Inline content is parsed in a
//! second phase once the tree and the link reference table are complete.

pub(crate) mod html;
mod list;
mod parser;

pub use parser::Parser;
