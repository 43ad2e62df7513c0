//! Block structure parser.
//!
//! Processes one logical line at a time against the tree of open blocks:
//! first the continuation predicates of the open spine, then the block
//! start conditions on the remainder, then text consumption. Unmatched
//! blocks are closed only when a new block actually starts, which is what
//! makes lazy paragraph continuation work. No backtracking across lines.

use super::html::{html_block_end, html_block_start, html_block_start_7};
use super::list::{list_is_tight, parse_list_marker};
use crate::entity::unescape_string;
use crate::inline::parse_inlines;
use crate::link_ref::{parse_reference, LinkRefStore};
use crate::scan::is_space_or_tab;
use crate::tree::{BlockId, BlockKind, BlockTree, CodeData, Document};

/// Result of a continuation predicate.
enum Continue {
    /// The block consumed its marker; keep descending.
    Matched,
    /// The block does not continue on this line.
    NotMatched,
    /// The line was fully consumed (closing code fence).
    LineDone,
}

/// Result of a block start condition.
enum Start {
    None,
    /// A container block was opened; keep scanning the remainder.
    Container,
    /// A leaf block was opened; the remainder is its text.
    Leaf,
}

/// The phase-1 parser.
pub struct Parser {
    pub(crate) tree: BlockTree,
    pub(crate) tip: BlockId,
    oldtip: BlockId,
    last_matched_container: BlockId,
    refs: LinkRefStore,
    pub(crate) line: Vec<u8>,
    line_number: usize,
    pub(crate) offset: usize,
    pub(crate) column: usize,
    pub(crate) next_nonspace: usize,
    next_nonspace_column: usize,
    pub(crate) indent: usize,
    blank: bool,
    pub(crate) partially_consumed_tab: bool,
    all_closed: bool,
}

impl Parser {
    pub fn new() -> Self {
        let tree = BlockTree::new();
        let root = tree.root();
        Self {
            tree,
            tip: root,
            oldtip: root,
            last_matched_container: root,
            refs: LinkRefStore::new(),
            line: Vec::new(),
            line_number: 0,
            offset: 0,
            column: 0,
            next_nonspace: 0,
            next_nonspace_column: 0,
            indent: 0,
            blank: false,
            partially_consumed_tab: false,
            all_closed: true,
        }
    }

    /// Incorporate one logical line (without its terminator).
    pub fn process_line(&mut self, line: &[u8]) {
        self.line.clear();
        self.line.extend_from_slice(line);
        self.line_number += 1;
        self.offset = 0;
        self.column = 0;
        self.blank = false;
        self.partially_consumed_tab = false;
        self.oldtip = self.tip;

        // Matching phase: walk the open spine from the root down,
        // stopping at the first block whose continuation fails.
        let mut container = self.tree.root();
        loop {
            let Some(child) = self
                .tree
                .last_child(container)
                .filter(|&c| self.tree.block(c).open)
            else {
                break;
            };
            container = child;
            self.find_next_nonspace();
            match self.check_continue(container) {
                Continue::Matched => {}
                Continue::NotMatched => {
                    container = self
                        .tree
                        .block(container)
                        .parent
                        .expect("matched spine block has a parent");
                    break;
                }
                Continue::LineDone => return,
            }
        }

        self.all_closed = container == self.oldtip;
        self.last_matched_container = container;

        let mut matched_leaf = !matches!(self.tree.block(container).kind, BlockKind::Paragraph)
            && self.tree.block(container).kind.accepts_lines();

        // New-block-start phase.
        while !matched_leaf {
            self.find_next_nonspace();
            if self.indent < 4 && !maybe_special(self.line.get(self.next_nonspace).copied()) {
                self.advance_next_nonspace();
                break;
            }
            match self.try_block_starts(container) {
                Start::None => {
                    self.advance_next_nonspace();
                    break;
                }
                Start::Container => container = self.tip,
                Start::Leaf => {
                    container = self.tip;
                    matched_leaf = true;
                }
            }
        }

        // Text-consumption phase.
        if !self.all_closed
            && !self.blank
            && matches!(self.tree.block(self.tip).kind, BlockKind::Paragraph)
        {
            // lazy paragraph continuation
            self.add_line();
        } else {
            self.close_unmatched_blocks();
            if self.blank {
                if let Some(last) = self.tree.last_child(container) {
                    self.tree.block_mut(last).last_line_blank = true;
                }
            }

            let block = self.tree.block(container);
            let blank_exempt = match &block.kind {
                BlockKind::BlockQuote
                | BlockKind::Heading { .. }
                | BlockKind::ThematicBreak => true,
                BlockKind::CodeBlock(data) => data.fenced,
                // an item that just opened with a blank first line keeps
                // its one allowed blank line
                BlockKind::Item(_) => {
                    block.children.is_empty() && block.start_line == self.line_number
                }
                _ => false,
            };
            let last_line_blank = self.blank && !blank_exempt;
            let mut cursor = Some(container);
            while let Some(id) = cursor {
                self.tree.block_mut(id).last_line_blank = last_line_blank;
                cursor = self.tree.block(id).parent;
            }

            if self.tree.block(container).kind.accepts_lines() {
                self.add_line();
                if let BlockKind::HtmlBlock { html_type } = self.tree.block(container).kind {
                    if (1..=5).contains(&html_type) {
                        let done = html_block_end(html_type, &self.line[self.offset.min(self.line.len())..]);
                        if done {
                            self.finalize(container);
                        }
                    }
                }
            } else if self.offset < self.line.len() && !self.blank {
                self.add_child(BlockKind::Paragraph);
                self.advance_next_nonspace();
                self.add_line();
            }
        }
    }

    /// Close everything, classify lists, and run inline parsing over the
    /// finished tree.
    pub fn finish(mut self) -> Document {
        loop {
            let tip = self.tip;
            let parent = self.tree.block(tip).parent;
            self.finalize(tip);
            if parent.is_none() {
                break;
            }
        }

        // Phase 2: the reference table is frozen now; each leaf's raw
        // text parses independently.
        let mut stack = vec![self.tree.root()];
        while let Some(id) = stack.pop() {
            stack.extend(self.tree.block(id).children.iter().copied());
            if matches!(
                self.tree.block(id).kind,
                BlockKind::Paragraph | BlockKind::Heading { .. }
            ) {
                let content = std::mem::take(&mut self.tree.block_mut(id).content);
                let inlines = parse_inlines(&content, &self.refs);
                self.tree.block_mut(id).inlines = inlines;
            }
        }

        Document { tree: self.tree }
    }

    /// The frozen reference table (after `finish`, for diagnostics).
    pub fn link_refs(&self) -> &LinkRefStore {
        &self.refs
    }

    // --- line geometry ---

    fn find_next_nonspace(&mut self) {
        let mut i = self.offset;
        let mut cols = self.column;
        loop {
            match self.line.get(i) {
                Some(b' ') => {
                    i += 1;
                    cols += 1;
                }
                Some(b'\t') => {
                    i += 1;
                    cols += 4 - (cols % 4);
                }
                _ => break,
            }
        }
        self.blank = i >= self.line.len();
        self.next_nonspace = i;
        self.next_nonspace_column = cols;
        self.indent = cols - self.column;
    }

    pub(crate) fn advance_next_nonspace(&mut self) {
        self.offset = self.next_nonspace;
        self.column = self.next_nonspace_column;
        self.partially_consumed_tab = false;
    }

    /// Advance by `count` bytes, or by `count` columns when `columns` is
    /// set (tab-stop aware; a tab may be consumed partially).
    pub(crate) fn advance_offset(&mut self, mut count: usize, columns: bool) {
        while count > 0 {
            match self.line.get(self.offset) {
                Some(b'\t') => {
                    let chars_to_tab = 4 - (self.column % 4);
                    if columns {
                        self.partially_consumed_tab = chars_to_tab > count;
                        let advance = chars_to_tab.min(count);
                        self.column += advance;
                        if !self.partially_consumed_tab {
                            self.offset += 1;
                        }
                        count -= advance;
                    } else {
                        self.partially_consumed_tab = false;
                        self.column += chars_to_tab;
                        self.offset += 1;
                        count -= 1;
                    }
                }
                Some(_) => {
                    self.partially_consumed_tab = false;
                    self.offset += 1;
                    self.column += 1;
                    count -= 1;
                }
                None => break,
            }
        }
    }

    // --- tree plumbing ---

    /// Append the rest of the line to the tip's buffer. A partially
    /// consumed tab materializes as the spaces left to its stop.
    fn add_line(&mut self) {
        let mut spaces = 0;
        if self.partially_consumed_tab {
            self.offset += 1;
            spaces = 4 - (self.column % 4);
        }
        let tip = self.tip;
        let content = &mut self.tree.block_mut(tip).content;
        for _ in 0..spaces {
            content.push(b' ');
        }
        content.extend_from_slice(&self.line[self.offset.min(self.line.len())..]);
        content.push(b'\n');
    }

    /// Open a new block as a child of the tip, closing blocks that
    /// cannot contain it.
    fn add_child(&mut self, kind: BlockKind) -> BlockId {
        while !self.tree.block(self.tip).kind.can_contain(&kind) {
            let tip = self.tip;
            self.finalize(tip);
        }
        let id = self.tree.append_child(self.tip, kind, self.line_number);
        self.tip = id;
        id
    }

    fn close_unmatched_blocks(&mut self) {
        if self.all_closed {
            return;
        }
        while self.oldtip != self.last_matched_container {
            let parent = self
                .tree
                .block(self.oldtip)
                .parent
                .expect("unmatched block has a parent");
            let block = self.oldtip;
            self.finalize(block);
            self.oldtip = parent;
        }
        self.all_closed = true;
    }

    /// Close a block: mark it closed, run its kind-specific finalization,
    /// and move the tip to its parent. Closing is monotonic.
    fn finalize(&mut self, id: BlockId) {
        debug_assert!(self.tree.block(id).open, "finalize on a closed block");
        let parent = self.tree.block(id).parent;
        self.tree.block_mut(id).open = false;

        match self.tree.block(id).kind.clone() {
            BlockKind::Paragraph => self.finalize_paragraph(id),
            BlockKind::CodeBlock(data) => self.finalize_code_block(id, data),
            BlockKind::List(mut data) => {
                data.tight = list_is_tight(&self.tree, id);
                self.tree.block_mut(id).kind = BlockKind::List(data);
            }
            _ => {}
        }

        if let Some(parent) = parent {
            self.tip = parent;
        }
    }

    /// Extract leading link reference definitions; a paragraph left with
    /// nothing but definitions disappears from the tree.
    fn finalize_paragraph(&mut self, id: BlockId) {
        let content = std::mem::take(&mut self.tree.block_mut(id).content);
        let mut start = 0;
        let mut has_refs = false;
        while content.get(start) == Some(&b'[') {
            let consumed = parse_reference(&content[start..], &mut self.refs);
            if consumed == 0 {
                break;
            }
            start += consumed;
            has_refs = true;
        }
        let rest = &content[start..];
        if has_refs && rest.iter().all(|b| b.is_ascii_whitespace()) {
            self.tree.unlink(id);
        } else {
            self.tree.block_mut(id).content = rest.to_vec();
        }
    }

    fn finalize_code_block(&mut self, id: BlockId, mut data: CodeData) {
        let content = std::mem::take(&mut self.tree.block_mut(id).content);
        if data.fenced {
            // first "line" of the buffer is the info string
            let newline = memchr::memchr(b'\n', &content).unwrap_or(content.len());
            let info_raw = trim_space_tab(&content[..newline]);
            data.info = String::from_utf8_lossy(&unescape_string(info_raw)).into_owned();
            let literal = if newline < content.len() {
                content[newline + 1..].to_vec()
            } else {
                Vec::new()
            };
            self.tree.block_mut(id).content = literal;
            self.tree.block_mut(id).kind = BlockKind::CodeBlock(data);
        } else {
            // strip trailing blank lines
            let mut end = content.len();
            loop {
                let mut e = end;
                while e > 0 && content[e - 1] == b' ' {
                    e -= 1;
                }
                if e > 0 && content[e - 1] == b'\n' {
                    end = e - 1;
                } else {
                    break;
                }
            }
            let mut literal = content[..end].to_vec();
            literal.push(b'\n');
            self.tree.block_mut(id).content = literal;
        }
    }

    // --- continuation predicates ---

    fn check_continue(&mut self, id: BlockId) -> Continue {
        match self.tree.block(id).kind.clone() {
            BlockKind::Document | BlockKind::List(_) => Continue::Matched,
            BlockKind::BlockQuote => self.continue_block_quote(),
            BlockKind::Item(data) => {
                let empty = self.tree.block(id).children.is_empty();
                if self.blank {
                    if empty {
                        Continue::NotMatched
                    } else {
                        self.advance_next_nonspace();
                        Continue::Matched
                    }
                } else if self.indent >= data.marker_offset + data.padding {
                    self.advance_offset(data.marker_offset + data.padding, true);
                    Continue::Matched
                } else {
                    Continue::NotMatched
                }
            }
            BlockKind::Paragraph => {
                if self.blank {
                    Continue::NotMatched
                } else {
                    Continue::Matched
                }
            }
            BlockKind::Heading { .. } | BlockKind::ThematicBreak => Continue::NotMatched,
            BlockKind::CodeBlock(data) => self.continue_code_block(id, &data),
            BlockKind::HtmlBlock { html_type } => {
                if self.blank && (html_type == 6 || html_type == 7) {
                    Continue::NotMatched
                } else {
                    Continue::Matched
                }
            }
        }
    }

    fn continue_block_quote(&mut self) -> Continue {
        if self.indent <= 3 && self.line.get(self.next_nonspace) == Some(&b'>') {
            self.advance_next_nonspace();
            self.advance_offset(1, false);
            if self.line.get(self.offset).copied().is_some_and(is_space_or_tab) {
                self.advance_offset(1, true);
            }
            Continue::Matched
        } else {
            Continue::NotMatched
        }
    }

    fn continue_code_block(&mut self, id: BlockId, data: &CodeData) -> Continue {
        if data.fenced {
            let rest = &self.line[self.next_nonspace.min(self.line.len())..];
            if self.indent <= 3 && rest.first() == Some(&data.fence_char) {
                let mut run = 0;
                while rest.get(run) == Some(&data.fence_char) {
                    run += 1;
                }
                if run >= data.fence_length
                    && rest[run..].iter().all(|&b| is_space_or_tab(b))
                {
                    self.finalize(id);
                    return Continue::LineDone;
                }
            }
            // skip over the columns the opening fence was indented by
            let mut remaining = data.fence_offset;
            while remaining > 0
                && self.line.get(self.offset).copied().is_some_and(is_space_or_tab)
            {
                self.advance_offset(1, true);
                remaining -= 1;
            }
            Continue::Matched
        } else if self.indent >= 4 {
            self.advance_offset(4, true);
            Continue::Matched
        } else if self.blank {
            self.advance_next_nonspace();
            Continue::Matched
        } else {
            Continue::NotMatched
        }
    }

    // --- block start conditions ---

    fn try_block_starts(&mut self, container: BlockId) -> Start {
        let indented = self.indent >= 4;
        let next = self.line.get(self.next_nonspace).copied();

        // block quote
        if !indented && next == Some(b'>') {
            self.advance_next_nonspace();
            self.advance_offset(1, false);
            if self.line.get(self.offset).copied().is_some_and(is_space_or_tab) {
                self.advance_offset(1, true);
            }
            self.close_unmatched_blocks();
            self.add_child(BlockKind::BlockQuote);
            return Start::Container;
        }

        // ATX heading
        if !indented && next == Some(b'#') {
            if let Some((level, marker_len)) = scan_atx_marker(&self.line[self.next_nonspace..]) {
                self.advance_next_nonspace();
                self.advance_offset(marker_len, false);
                self.close_unmatched_blocks();
                let id = self.add_child(BlockKind::Heading { level, setext: false });
                let content = strip_atx_closing(&self.line[self.offset..]).to_vec();
                self.tree.block_mut(id).content = content;
                let rest = self.line.len() - self.offset;
                self.advance_offset(rest, false);
                return Start::Leaf;
            }
        }

        // fenced code
        if !indented && matches!(next, Some(b'`') | Some(b'~')) {
            if let Some((fence_char, fence_length)) =
                scan_code_fence(&self.line[self.next_nonspace..])
            {
                let fence_offset = self.indent;
                self.close_unmatched_blocks();
                self.add_child(BlockKind::CodeBlock(CodeData {
                    fenced: true,
                    fence_char,
                    fence_length,
                    fence_offset,
                    info: String::new(),
                }));
                self.advance_next_nonspace();
                self.advance_offset(fence_length, false);
                return Start::Leaf;
            }
        }

        // HTML block
        if !indented && next == Some(b'<') {
            let s = &self.line[self.next_nonspace..];
            let mut html_type = html_block_start(s);
            if html_type.is_none() {
                let interrupts_paragraph =
                    matches!(self.tree.block(container).kind, BlockKind::Paragraph)
                        || (!self.all_closed
                            && !self.blank
                            && matches!(self.tree.block(self.tip).kind, BlockKind::Paragraph));
                if !interrupts_paragraph && html_block_start_7(s) {
                    html_type = Some(7);
                }
            }
            if let Some(html_type) = html_type {
                self.close_unmatched_blocks();
                self.add_child(BlockKind::HtmlBlock { html_type });
                return Start::Leaf;
            }
        }

        // setext heading underline
        if !indented && matches!(self.tree.block(container).kind, BlockKind::Paragraph) {
            if let Some(level) = scan_setext_underline(&self.line[self.next_nonspace..]) {
                self.close_unmatched_blocks();
                // reference definitions at the top of the paragraph are
                // still definitions, not heading text
                let mut content = std::mem::take(&mut self.tree.block_mut(container).content);
                let mut start = 0;
                while content.get(start) == Some(&b'[') {
                    let consumed = parse_reference(&content[start..], &mut self.refs);
                    if consumed == 0 {
                        break;
                    }
                    start += consumed;
                }
                content.drain(..start);
                let empty = content.is_empty();
                self.tree.block_mut(container).content = content;
                if !empty {
                    self.tree.block_mut(container).kind =
                        BlockKind::Heading { level, setext: true };
                    let rest = self.line.len() - self.offset;
                    self.advance_offset(rest, false);
                    return Start::Leaf;
                }
                // only definitions: the underline may still start some
                // other block below
            }
        }

        // thematic break
        if !indented && scan_thematic_break(&self.line[self.next_nonspace..]) {
            self.close_unmatched_blocks();
            self.add_child(BlockKind::ThematicBreak);
            let rest = self.line.len() - self.offset;
            self.advance_offset(rest, false);
            return Start::Leaf;
        }

        // list item
        let container_is_list = matches!(self.tree.block(container).kind, BlockKind::List(_));
        if !indented || container_is_list {
            if let Some(data) = parse_list_marker(self, container) {
                self.close_unmatched_blocks();
                let tip_matches = match &self.tree.block(self.tip).kind {
                    BlockKind::List(existing) => existing.matches(&data),
                    _ => false,
                };
                if !tip_matches {
                    self.add_child(BlockKind::List(data));
                }
                self.add_child(BlockKind::Item(data));
                return Start::Container;
            }
        }

        // indented code
        if indented
            && !matches!(self.tree.block(self.tip).kind, BlockKind::Paragraph)
            && !self.blank
        {
            self.advance_offset(4, true);
            self.close_unmatched_blocks();
            self.add_child(BlockKind::CodeBlock(CodeData {
                fenced: false,
                fence_char: 0,
                fence_length: 0,
                fence_offset: 0,
                info: String::new(),
            }));
            return Start::Leaf;
        }

        Start::None
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Fast path: bytes that can begin a block start condition.
#[inline]
fn maybe_special(b: Option<u8>) -> bool {
    matches!(
        b,
        Some(
            b'#' | b'`' | b'~' | b'*' | b'+' | b'_' | b'=' | b'<' | b'>' | b'-'
                | b'0'..=b'9'
        )
    )
}

fn trim_space_tab(mut s: &[u8]) -> &[u8] {
    while let Some((first, rest)) = s.split_first() {
        if is_space_or_tab(*first) {
            s = rest;
        } else {
            break;
        }
    }
    while let Some((last, rest)) = s.split_last() {
        if is_space_or_tab(*last) {
            s = rest;
        } else {
            break;
        }
    }
    s
}

/// `#{1,6}` followed by space, tab, or end of line.
/// Returns the level and the marker length including following spaces.
fn scan_atx_marker(s: &[u8]) -> Option<(u8, usize)> {
    let mut hashes = 0;
    while s.get(hashes) == Some(&b'#') {
        hashes += 1;
    }
    if hashes == 0 || hashes > 6 {
        return None;
    }
    match s.get(hashes) {
        None => Some((hashes as u8, hashes)),
        Some(&b) if is_space_or_tab(b) => {
            let mut len = hashes;
            while s.get(len).copied().is_some_and(is_space_or_tab) {
                len += 1;
            }
            Some((hashes as u8, len))
        }
        _ => None,
    }
}

/// Strip an optional closing hash sequence (and a line of nothing but
/// hashes) from ATX heading text.
fn strip_atx_closing(rest: &[u8]) -> &[u8] {
    let trimmed = trim_space_tab(rest);
    if !trimmed.is_empty() && trimmed.iter().all(|&b| b == b'#') {
        return b"";
    }
    let mut end = rest.len();
    while end > 0 && is_space_or_tab(rest[end - 1]) {
        end -= 1;
    }
    let hash_end = end;
    while end > 0 && rest[end - 1] == b'#' {
        end -= 1;
    }
    if end < hash_end && end > 0 && is_space_or_tab(rest[end - 1]) {
        while end > 0 && is_space_or_tab(rest[end - 1]) {
            end -= 1;
        }
        return &rest[..end];
    }
    rest
}

/// A run of 3+ backticks (with no backtick later on the line) or tildes.
fn scan_code_fence(s: &[u8]) -> Option<(u8, usize)> {
    let fence_char = match s.first() {
        Some(&c @ (b'`' | b'~')) => c,
        _ => return None,
    };
    let mut len = 0;
    while s.get(len) == Some(&fence_char) {
        len += 1;
    }
    if len < 3 {
        return None;
    }
    if fence_char == b'`' && memchr::memchr(b'`', &s[len..]).is_some() {
        return None;
    }
    Some((fence_char, len))
}

/// `=+` or `-+` followed by only spaces and tabs.
fn scan_setext_underline(s: &[u8]) -> Option<u8> {
    let (ch, level) = match s.first() {
        Some(b'=') => (b'=', 1),
        Some(b'-') => (b'-', 2),
        _ => return None,
    };
    let mut i = 0;
    while s.get(i) == Some(&ch) {
        i += 1;
    }
    s[i..].iter().all(|&b| is_space_or_tab(b)).then_some(level)
}

/// Three or more `-`, `_`, or `*`, interleaved with spaces and tabs only.
fn scan_thematic_break(s: &[u8]) -> bool {
    let marker = match s.first() {
        Some(&c @ (b'-' | b'_' | b'*')) => c,
        _ => return false,
    };
    let mut count = 0;
    for &b in s {
        if b == marker {
            count += 1;
        } else if !is_space_or_tab(b) {
            return false;
        }
    }
    count >= 3
}
