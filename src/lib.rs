//! arbormark: tree-building CommonMark parser and HTML renderer
//!
//! Two-phase engine over an in-memory buffer:
//! 1. The block parser consumes logical lines and incrementally builds an
//!    arena-backed tree of container and leaf blocks, collecting link
//!    reference definitions as a side effect.
//! 2. Once input is exhausted and the reference table is frozen, each
//!    paragraph/heading buffer is parsed into inline nodes with a
//!    delimiter-stack algorithm (no backtracking in either phase).
//!
//! The renderer is a pure function of the finished tree.
//!
//! # Design principles
//! - No regex: pure byte-level scanning
//! - No backtracking: every line and every inline character is consumed
//!   once; emphasis resolution is O(n) amortized
//! - No syntax errors: malformed constructs fall back to literal text

pub mod block;
pub mod entity;
pub mod escape;
pub mod inline;
pub mod limits;
pub mod line;
pub mod link_ref;
pub mod render;
pub mod scan;
pub mod tree;

// Re-export primary types
pub use block::Parser;
pub use inline::{Inline, LinkData};
pub use link_ref::{LinkRefDef, LinkRefStore};
pub use render::{render_html, HtmlRenderer};
pub use tree::{Block, BlockId, BlockKind, Document};

use line::LineReader;

/// Parse a document into its block tree.
///
/// # Example
/// ```
/// let doc = arbormark::parse("# Hello\n\nWorld");
/// assert_eq!(arbormark::render_html(&doc), "<h1>Hello</h1>\n<p>World</p>\n");
/// ```
pub fn parse(input: &str) -> Document {
    let mut parser = Parser::new();
    for line in LineReader::new(input.as_bytes()) {
        parser.process_line(&line);
    }
    parser.finish()
}

/// Convert Markdown to HTML.
///
/// This is the primary API for simple use cases.
///
/// # Example
/// ```
/// let html = arbormark::to_html("# Hello\n\nWorld");
/// assert!(html.contains("<h1>Hello</h1>"));
/// assert!(html.contains("<p>World</p>"));
/// ```
pub fn to_html(input: &str) -> String {
    render_html(&parse(input))
}

/// Convert Markdown to HTML, appending into a provided buffer.
pub fn to_html_into(input: &str, out: &mut Vec<u8>) {
    out.extend_from_slice(to_html(input).as_bytes());
}
