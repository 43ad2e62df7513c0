//! HTML renderer.
//!
//! A pure walk over the finished tree. Newlines between tags follow the
//! `cr` discipline: emit one only when the buffer does not already end
//! with a newline, which is what produces the reference tight/loose list
//! and blockquote layouts without special cases.

use crate::escape::{escape_href_into, escape_html_into};
use crate::inline::Inline;
use crate::tree::{BlockId, BlockKind, Document, ListKind};

/// Render a finished document to HTML.
pub fn render_html(doc: &Document) -> String {
    let mut renderer = HtmlRenderer::new();
    renderer.render_children(doc, doc.root());
    renderer.into_string()
}

/// HTML output writer over a byte buffer.
pub struct HtmlRenderer {
    out: Vec<u8>,
}

impl HtmlRenderer {
    pub fn new() -> Self {
        Self {
            out: Vec::with_capacity(256),
        }
    }

    pub fn into_string(self) -> String {
        String::from_utf8(self.out).unwrap_or_default()
    }

    #[inline]
    fn write_str(&mut self, s: &str) {
        self.out.extend_from_slice(s.as_bytes());
    }

    #[inline]
    fn write_escaped(&mut self, bytes: &[u8]) {
        escape_html_into(&mut self.out, bytes);
    }

    #[inline]
    fn write_href(&mut self, bytes: &[u8]) {
        escape_href_into(&mut self.out, bytes);
    }

    /// Emit a newline unless the buffer is empty or already ends with one.
    fn cr(&mut self) {
        if !self.out.is_empty() && self.out.last() != Some(&b'\n') {
            self.out.push(b'\n');
        }
    }

    fn render_children(&mut self, doc: &Document, id: BlockId) {
        for &child in &doc.block(id).children {
            self.render_block(doc, child);
        }
    }

    fn render_block(&mut self, doc: &Document, id: BlockId) {
        let block = doc.block(id);
        match &block.kind {
            BlockKind::Document => self.render_children(doc, id),
            BlockKind::Paragraph => {
                if self.in_tight_list(doc, id) {
                    self.render_inlines(&block.inlines);
                } else {
                    self.cr();
                    self.write_str("<p>");
                    self.render_inlines(&block.inlines);
                    self.write_str("</p>");
                    self.cr();
                }
            }
            BlockKind::Heading { level, .. } => {
                let level = *level;
                self.cr();
                self.write_str("<h");
                self.out.push(b'0' + level);
                self.out.push(b'>');
                self.render_inlines(&block.inlines);
                self.write_str("</h");
                self.out.push(b'0' + level);
                self.out.push(b'>');
                self.cr();
            }
            BlockKind::ThematicBreak => {
                self.cr();
                self.write_str("<hr />");
                self.cr();
            }
            BlockKind::CodeBlock(data) => {
                self.cr();
                self.write_str("<pre><code");
                if let Some(lang) = data.info.split_whitespace().next() {
                    self.write_str(" class=\"language-");
                    self.write_escaped(lang.as_bytes());
                    self.write_str("\"");
                }
                self.write_str(">");
                self.write_escaped(&block.content);
                self.write_str("</code></pre>");
                self.cr();
            }
            BlockKind::HtmlBlock { .. } => {
                self.cr();
                self.out.extend_from_slice(&block.content);
                self.cr();
            }
            BlockKind::BlockQuote => {
                self.cr();
                self.write_str("<blockquote>");
                self.cr();
                self.render_children(doc, id);
                self.cr();
                self.write_str("</blockquote>");
                self.cr();
            }
            BlockKind::List(data) => {
                self.cr();
                match data.kind {
                    ListKind::Bullet { .. } => self.write_str("<ul>"),
                    ListKind::Ordered { start, .. } => {
                        if start == 1 {
                            self.write_str("<ol>");
                        } else {
                            self.write_str("<ol start=\"");
                            self.write_str(&start.to_string());
                            self.write_str("\">");
                        }
                    }
                }
                self.cr();
                self.render_children(doc, id);
                self.cr();
                match data.kind {
                    ListKind::Bullet { .. } => self.write_str("</ul>"),
                    ListKind::Ordered { .. } => self.write_str("</ol>"),
                }
                self.cr();
            }
            BlockKind::Item(_) => {
                self.cr();
                self.write_str("<li>");
                self.render_children(doc, id);
                self.write_str("</li>");
                self.cr();
            }
        }
    }

    /// Paragraphs directly inside an item of a tight list render bare.
    fn in_tight_list(&self, doc: &Document, id: BlockId) -> bool {
        let Some(parent) = doc.block(id).parent else {
            return false;
        };
        if !matches!(doc.block(parent).kind, BlockKind::Item(_)) {
            return false;
        }
        match doc.block(parent).parent {
            Some(grand) => {
                matches!(doc.block(grand).kind, BlockKind::List(data) if data.tight)
            }
            None => false,
        }
    }

    fn render_inlines(&mut self, inlines: &[Inline]) {
        for inline in inlines {
            self.render_inline(inline);
        }
    }

    fn render_inline(&mut self, inline: &Inline) {
        match inline {
            Inline::Text(text) => self.write_escaped(text.as_bytes()),
            Inline::SoftBreak => self.write_str("\n"),
            Inline::HardBreak => self.write_str("<br />\n"),
            Inline::Code(code) => {
                self.write_str("<code>");
                self.write_escaped(code.as_bytes());
                self.write_str("</code>");
            }
            Inline::Html(raw) => self.write_str(raw),
            Inline::Emph(children) => {
                self.write_str("<em>");
                self.render_inlines(children);
                self.write_str("</em>");
            }
            Inline::Strong(children) => {
                self.write_str("<strong>");
                self.render_inlines(children);
                self.write_str("</strong>");
            }
            Inline::Link(link) => {
                self.write_str("<a href=\"");
                self.write_href(link.destination.as_bytes());
                self.write_str("\"");
                if !link.title.is_empty() {
                    self.write_str(" title=\"");
                    self.write_escaped(link.title.as_bytes());
                    self.write_str("\"");
                }
                self.write_str(">");
                self.render_inlines(&link.children);
                self.write_str("</a>");
            }
            Inline::Image(image) => {
                self.write_str("<img src=\"");
                self.write_href(image.destination.as_bytes());
                self.write_str("\" alt=\"");
                let mut alt = String::new();
                flatten_plain(&image.children, &mut alt);
                self.write_escaped(alt.as_bytes());
                self.write_str("\"");
                if !image.title.is_empty() {
                    self.write_str(" title=\"");
                    self.write_escaped(image.title.as_bytes());
                    self.write_str("\"");
                }
                self.write_str(" />");
            }
            Inline::Autolink { uri, email } => {
                self.write_str("<a href=\"");
                if *email {
                    self.write_str("mailto:");
                }
                self.write_href(uri.as_bytes());
                self.write_str("\">");
                self.write_escaped(uri.as_bytes());
                self.write_str("</a>");
            }
        }
    }
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Image alt text is the flattened plain form of the children: literals
/// survive, breaks become spaces, markup disappears.
fn flatten_plain(inlines: &[Inline], out: &mut String) {
    for inline in inlines {
        match inline {
            Inline::Text(text) | Inline::Code(text) | Inline::Html(text) => out.push_str(text),
            Inline::SoftBreak | Inline::HardBreak => out.push(' '),
            Inline::Emph(children) | Inline::Strong(children) => flatten_plain(children, out),
            Inline::Link(link) => flatten_plain(&link.children, out),
            Inline::Image(image) => flatten_plain(&image.children, out),
            Inline::Autolink { uri, .. } => out.push_str(uri),
        }
    }
}
