//! Link reference definitions.
//!
//! Definitions are extracted from paragraph openings when the paragraph
//! closes; the table is frozen before inline parsing starts and is
//! shared-read from then on.

use crate::entity::unescape_string;
use crate::inline::links::{scan_link_destination, scan_link_label, scan_link_title};
use crate::scan::Scanner;
use rustc_hash::FxHashMap;

/// A link reference definition: destination plus optional title
/// (empty when absent). Both are stored with escapes and entities
/// resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRefDef {
    pub destination: String,
    pub title: String,
}

/// Store of link reference definitions, keyed by normalized label.
/// The first definition for a label wins; later duplicates are ignored.
#[derive(Debug, Default)]
pub struct LinkRefStore {
    defs: FxHashMap<String, LinkRefDef>,
}

impl LinkRefStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition if the label is new.
    pub fn insert(&mut self, label: String, def: LinkRefDef) {
        self.defs.entry(label).or_insert(def);
    }

    pub fn get(&self, label: &str) -> Option<&LinkRefDef> {
        self.defs.get(label)
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }
}

/// Normalize a link label: trim, collapse internal whitespace to single
/// spaces, and case-fold.
pub fn normalize_label(raw: &[u8]) -> String {
    let label = String::from_utf8_lossy(raw);
    let mut out = String::with_capacity(label.len());
    let mut pending_space = false;
    for ch in label.trim().chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        // to_lowercase approximates Unicode case folding; the sharp s
        // forms need the fold to "ss" explicitly
        if ch == 'ß' || ch == 'ẞ' {
            out.push_str("ss");
        } else {
            for lc in ch.to_lowercase() {
                out.push(lc);
            }
        }
    }
    out
}

/// After `pos`, accept only spaces and then a line ending (or end of
/// input). Returns the position past the line ending.
fn scan_line_end(s: &[u8], pos: usize) -> Option<usize> {
    let mut i = pos;
    while s.get(i) == Some(&b' ') {
        i += 1;
    }
    match s.get(i) {
        None => Some(i),
        Some(b'\n') => Some(i + 1),
        _ => None,
    }
}

/// Try to parse one link reference definition at the start of `s`
/// (a closing paragraph's remaining content). Returns the number of
/// bytes consumed, or 0 if `s` does not open with a definition.
pub fn parse_reference(s: &[u8], store: &mut LinkRefStore) -> usize {
    let Some(label_end) = scan_link_label(s, 0) else {
        return 0;
    };
    if s.get(label_end) != Some(&b':') {
        return 0;
    }

    let mut sc = Scanner::new_at(s, label_end + 1);
    sc.skip_spnl();
    let Some((dest_end, dest_start, dest_stop)) = scan_link_destination(s, sc.pos()) else {
        return 0;
    };

    let before_title = dest_end;
    let mut sc = Scanner::new_at(s, before_title);
    sc.skip_spnl();
    let title = if sc.pos() != before_title {
        scan_link_title(s, sc.pos())
    } else {
        None
    };

    let (consumed, title_span) = match title {
        Some((title_end, ts, te)) => match scan_line_end(s, title_end) {
            Some(end) => (end, Some((ts, te))),
            // the title doesn't sit on its own line end; retry without it
            None => match scan_line_end(s, before_title) {
                Some(end) => (end, None),
                None => return 0,
            },
        },
        None => match scan_line_end(s, before_title) {
            Some(end) => (end, None),
            None => return 0,
        },
    };

    let label = normalize_label(&s[1..label_end - 1]);
    if label.is_empty() {
        return 0;
    }

    let destination =
        String::from_utf8_lossy(&unescape_string(&s[dest_start..dest_stop])).into_owned();
    let title = title_span
        .map(|(ts, te)| String::from_utf8_lossy(&unescape_string(&s[ts..te])).into_owned())
        .unwrap_or_default();

    store.insert(label, LinkRefDef { destination, title });
    consumed
}
