//! Inline parser.
//!
//! Single left-to-right pass over a leaf block's raw text. Code spans,
//! autolinks, and raw HTML resolve eagerly; emphasis and links go through
//! the delimiter and bracket stacks and are resolved on `]` and at end of
//! input. Malformed constructs always fall back to literal text.

pub(crate) mod autolink;
pub(crate) mod code_span;
pub(crate) mod delimiter;
pub(crate) mod html;
pub(crate) mod links;
mod node;

pub use node::{Inline, LinkData};

use crate::entity::{decode_entity, unescape_string};
use crate::link_ref::{normalize_label, LinkRefStore};
use crate::scan::{is_ascii_punctuation, Scanner};
use autolink::scan_autolink;
use code_span::scan_code_span;
use delimiter::{process_emphasis, scan_delims, DelimId, DelimStack};
use html::scan_html_inline;
use links::{scan_link_destination, scan_link_label, scan_link_title};
use node::{InlId, InlineArena, WorkKind};

/// Characters that interrupt a plain text run.
const SPECIAL_CHARS: [bool; 256] = {
    let mut table = [false; 256];
    table[b'\n' as usize] = true;
    table[b'`' as usize] = true;
    table[b'[' as usize] = true;
    table[b']' as usize] = true;
    table[b'\\' as usize] = true;
    table[b'!' as usize] = true;
    table[b'<' as usize] = true;
    table[b'&' as usize] = true;
    table[b'*' as usize] = true;
    table[b'_' as usize] = true;
    table
};

/// A `[` or `![` waiting for its `]`.
struct Bracket {
    /// The Text node holding the literal bracket.
    node: InlId,
    /// Delimiter stack top when the bracket was pushed; emphasis inside
    /// the span is resolved above this bound.
    prev_delim: Option<DelimId>,
    /// Subject position of the `[`.
    index: usize,
    image: bool,
    /// Deactivated openers fail to match (prevents links in links).
    active: bool,
    /// Whether another bracket opened after this one (rules out the
    /// shortcut form).
    bracket_after: bool,
}

/// Parse a leaf block's raw text into inline nodes, resolving reference
/// links against the frozen table.
pub fn parse_inlines(content: &[u8], refs: &LinkRefStore) -> Vec<Inline> {
    let subject = trim_ascii(content);
    let mut parser = InlineParser::new(subject, refs);
    while parser.pos < parser.subject.len() {
        parser.parse_inline();
    }
    process_emphasis(&mut parser.arena, &mut parser.delims, None);
    parser.arena.into_inlines(parser.root)
}

fn trim_ascii(mut s: &[u8]) -> &[u8] {
    while let Some((first, rest)) = s.split_first() {
        if matches!(first, b' ' | b'\t' | b'\n' | b'\r') {
            s = rest;
        } else {
            break;
        }
    }
    while let Some((last, rest)) = s.split_last() {
        if matches!(last, b' ' | b'\t' | b'\n' | b'\r') {
            s = rest;
        } else {
            break;
        }
    }
    s
}

struct InlineParser<'a> {
    subject: &'a [u8],
    pos: usize,
    arena: InlineArena,
    root: InlId,
    delims: DelimStack,
    brackets: Vec<Bracket>,
    refs: &'a LinkRefStore,
}

impl<'a> InlineParser<'a> {
    fn new(subject: &'a [u8], refs: &'a LinkRefStore) -> Self {
        let mut arena = InlineArena::new();
        let root = arena.alloc(WorkKind::Root);
        Self {
            subject,
            pos: 0,
            arena,
            root,
            delims: DelimStack::new(),
            brackets: Vec::new(),
            refs,
        }
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.subject.get(self.pos).copied()
    }

    fn append(&mut self, kind: WorkKind) -> InlId {
        let id = self.arena.alloc(kind);
        self.arena.append_child(self.root, id);
        id
    }

    fn append_text(&mut self, text: &str) -> InlId {
        self.append(WorkKind::Text(text.to_string()))
    }

    fn parse_inline(&mut self) {
        let Some(b) = self.peek() else { return };
        match b {
            b'\n' => self.parse_newline(),
            b'\\' => self.parse_backslash(),
            b'`' => self.parse_backticks(),
            b'*' | b'_' => self.parse_delim(b),
            b'[' => self.parse_open_bracket(),
            b'!' => self.parse_bang(),
            b']' => self.parse_close_bracket(),
            b'<' => self.parse_angle(),
            b'&' => self.parse_entity(),
            _ => self.parse_string(),
        }
    }

    /// Consume a run of ordinary characters as one Text node.
    fn parse_string(&mut self) {
        let start = self.pos;
        while self.pos < self.subject.len() && !SPECIAL_CHARS[self.subject[self.pos] as usize] {
            self.pos += 1;
        }
        debug_assert!(self.pos > start);
        let text = String::from_utf8_lossy(&self.subject[start..self.pos]).into_owned();
        self.append(WorkKind::Text(text));
    }

    /// Soft break, or hard break after two trailing spaces; leading
    /// spaces of the next line are consumed either way.
    fn parse_newline(&mut self) {
        self.pos += 1;
        let mut hardbreak = false;
        if let Some(last) = self.arena.node(self.root).last_child {
            if matches!(self.arena.node(last).kind, WorkKind::Text(_)) {
                let text = self.arena.text_mut(last);
                if text.ends_with(' ') {
                    hardbreak = text.ends_with("  ");
                    while text.ends_with(' ') {
                        text.pop();
                    }
                    if text.is_empty() {
                        self.arena.unlink(last);
                    }
                }
            }
        }
        self.append(if hardbreak {
            WorkKind::HardBreak
        } else {
            WorkKind::SoftBreak
        });
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
    }

    fn parse_backslash(&mut self) {
        self.pos += 1;
        match self.peek() {
            Some(b'\n') => {
                self.pos += 1;
                self.append(WorkKind::HardBreak);
                while self.peek() == Some(b' ') {
                    self.pos += 1;
                }
            }
            Some(b) if is_ascii_punctuation(b) => {
                self.pos += 1;
                self.append(WorkKind::Text((b as char).to_string()));
            }
            _ => {
                self.append_text("\\");
            }
        }
    }

    fn parse_backticks(&mut self) {
        let start = self.pos;
        let mut ticks = 0;
        while self.subject.get(start + ticks) == Some(&b'`') {
            ticks += 1;
        }
        match scan_code_span(self.subject, start, ticks) {
            Some((end, content)) => {
                self.append(WorkKind::Code(content));
                self.pos = end;
            }
            None => {
                self.pos = start + ticks;
                self.append(WorkKind::Text("`".repeat(ticks)));
            }
        }
    }

    fn parse_delim(&mut self, ch: u8) {
        let run = scan_delims(self.subject, self.pos, ch);
        let literal =
            String::from_utf8_lossy(&self.subject[self.pos..self.pos + run.count]).into_owned();
        self.pos += run.count;
        let node = self.append(WorkKind::Text(literal));
        if run.can_open || run.can_close {
            self.delims
                .push(node, ch, run.count, run.can_open, run.can_close);
        }
    }

    fn push_bracket(&mut self, node: InlId, index: usize, image: bool) {
        if let Some(top) = self.brackets.last_mut() {
            top.bracket_after = true;
        }
        self.brackets.push(Bracket {
            node,
            prev_delim: self.delims.top(),
            index,
            image,
            active: true,
            bracket_after: false,
        });
    }

    fn parse_open_bracket(&mut self) {
        let start = self.pos;
        self.pos += 1;
        let node = self.append_text("[");
        self.push_bracket(node, start, false);
    }

    fn parse_bang(&mut self) {
        self.pos += 1;
        if self.peek() == Some(b'[') {
            let start = self.pos;
            self.pos += 1;
            let node = self.append_text("![");
            self.push_bracket(node, start, true);
        } else {
            self.append_text("!");
        }
    }

    fn parse_angle(&mut self) {
        if let Some(link) = scan_autolink(self.subject, self.pos) {
            self.pos = link.end;
            self.append(WorkKind::Autolink {
                uri: link.uri,
                email: link.email,
            });
            return;
        }
        if let Some(end) = scan_html_inline(self.subject, self.pos) {
            let raw = String::from_utf8_lossy(&self.subject[self.pos..end]).into_owned();
            self.pos = end;
            self.append(WorkKind::Html(raw));
            return;
        }
        self.pos += 1;
        self.append_text("<");
    }

    fn parse_entity(&mut self) {
        match decode_entity(self.subject, self.pos) {
            Some((text, len)) => {
                self.pos += len;
                self.append(WorkKind::Text(text));
            }
            None => {
                self.pos += 1;
                self.append_text("&");
            }
        }
    }

    /// Resolution ladder for `]`: inline link, full reference, collapsed
    /// reference, shortcut reference; otherwise the bracket text stays
    /// literal.
    fn parse_close_bracket(&mut self) {
        self.pos += 1;
        let startpos = self.pos;

        let Some(opener_pos) = self.brackets.len().checked_sub(1) else {
            self.append_text("]");
            return;
        };
        if !self.brackets[opener_pos].active {
            self.brackets.pop();
            self.append_text("]");
            return;
        }
        let is_image = self.brackets[opener_pos].image;

        let mut matched: Option<(String, String)> = None;

        // inline form: `(dest "title")` immediately after
        if self.peek() == Some(b'(') {
            if let Some((end, dest, title)) = self.scan_inline_link_tail(self.pos + 1) {
                self.pos = end;
                matched = Some((dest, title));
            }
        }

        // reference forms
        if matched.is_none() {
            let before_label = self.pos;
            let label_end = scan_link_label(self.subject, before_label);
            let n = label_end.map_or(0, |e| e - before_label);

            let ref_label: Option<Vec<u8>> = if n > 2 {
                Some(self.subject[before_label + 1..before_label + n - 1].to_vec())
            } else if !self.brackets[opener_pos].bracket_after {
                let opener_index = self.brackets[opener_pos].index;
                Some(self.subject[opener_index + 1..startpos - 1].to_vec())
            } else {
                None
            };

            if let Some(raw) = ref_label {
                let label = normalize_label(&raw);
                if let Some(def) = self.refs.get(&label) {
                    matched = Some((def.destination.clone(), def.title.clone()));
                    if n >= 2 {
                        self.pos = before_label + n;
                    }
                }
            }
        }

        match matched {
            Some((destination, title)) => {
                let node = self.arena.alloc(if is_image {
                    WorkKind::Image { destination, title }
                } else {
                    WorkKind::Link { destination, title }
                });

                let opener = self.brackets.pop().expect("bracket opener present");

                // everything tokenized after the opener becomes children
                let mut cur = self.arena.node(opener.node).next;
                while let Some(id) = cur {
                    let next = self.arena.node(id).next;
                    self.arena.unlink(id);
                    self.arena.append_child(node, id);
                    cur = next;
                }
                self.arena.append_child(self.root, node);

                process_emphasis(&mut self.arena, &mut self.delims, opener.prev_delim);
                self.arena.unlink(opener.node);

                // links cannot contain links
                if !is_image {
                    for bracket in &mut self.brackets {
                        if !bracket.image {
                            bracket.active = false;
                        }
                    }
                }
            }
            None => {
                self.brackets.pop();
                self.pos = startpos;
                self.append_text("]");
            }
        }
    }

    /// Scan `(dest "title")` starting just past the `(`. Returns the end
    /// position and the resolved destination/title.
    fn scan_inline_link_tail(&self, after_paren: usize) -> Option<(usize, String, String)> {
        let mut sc = Scanner::new_at(self.subject, after_paren);
        sc.skip_spnl();
        let (dest_end, dest_start, dest_stop) = scan_link_destination(self.subject, sc.pos())?;

        let mut sc = Scanner::new_at(self.subject, dest_end);
        sc.skip_spnl();
        let title = if sc.pos() != dest_end {
            scan_link_title(self.subject, sc.pos())
        } else {
            None
        };

        let after_title = title.map_or_else(|| sc.pos(), |(end, _, _)| end);
        let mut sc = Scanner::new_at(self.subject, after_title);
        sc.skip_spnl();
        if sc.peek() != Some(b')') {
            return None;
        }

        let destination = String::from_utf8_lossy(&unescape_string(
            &self.subject[dest_start..dest_stop],
        ))
        .into_owned();
        let title = title
            .map(|(_, ts, te)| {
                String::from_utf8_lossy(&unescape_string(&self.subject[ts..te])).into_owned()
            })
            .unwrap_or_default();
        Some((sc.pos() + 1, destination, title))
    }
}
