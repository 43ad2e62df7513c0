//! HTML block start and end conditions.
//!
//! CommonMark defines seven kinds of HTML blocks, each with its own start
//! condition and its own way of ending: kinds 1-5 end on a closing token
//! that may appear mid-line (that line is still part of the block), kinds
//! 6-7 end at the next blank line.

use crate::inline::html::{scan_close_tag, scan_open_tag};
use crate::scan::is_space_or_tab;

/// Tag names whose raw text runs to an explicit closing tag (kind 1).
const VERBATIM_TAGS: [&[u8]; 4] = [b"pre", b"script", b"style", b"textarea"];

/// Block-level tag names for kind 6 (CommonMark 0.31.2 list).
const BLOCK_TAGS: [&[u8]; 62] = [
    b"address", b"article", b"aside", b"base", b"basefont", b"blockquote",
    b"body", b"caption", b"center", b"col", b"colgroup", b"dd", b"details",
    b"dialog", b"dir", b"div", b"dl", b"dt", b"fieldset", b"figcaption",
    b"figure", b"footer", b"form", b"frame", b"frameset", b"h1", b"h2",
    b"h3", b"h4", b"h5", b"h6", b"head", b"header", b"hr", b"html",
    b"iframe", b"legend", b"li", b"link", b"main", b"menu", b"menuitem",
    b"nav", b"noframes", b"ol", b"optgroup", b"option", b"p", b"param",
    b"search", b"section", b"summary", b"table", b"tbody", b"td", b"tfoot",
    b"th", b"thead", b"title", b"tr", b"track", b"ul",
];

/// Scan a tag name: ASCII letter followed by letters, digits, and `-`.
fn scan_tag_name(s: &[u8]) -> Option<usize> {
    if !s.first()?.is_ascii_alphabetic() {
        return None;
    }
    let mut i = 1;
    while i < s.len() && (s[i].is_ascii_alphanumeric() || s[i] == b'-') {
        i += 1;
    }
    Some(i)
}

fn name_in(name: &[u8], set: &[&[u8]]) -> bool {
    set.iter().any(|t| t.eq_ignore_ascii_case(name))
}

/// Test the start conditions for kinds 1-6 against a line beginning with
/// `<`. Kind 7 is handled separately because it may not interrupt a
/// paragraph.
pub fn html_block_start(s: &[u8]) -> Option<u8> {
    debug_assert_eq!(s.first(), Some(&b'<'));
    let rest = &s[1..];

    // Kind 2: comment
    if rest.starts_with(b"!--") {
        return Some(2);
    }
    // Kind 5: CDATA
    if rest.starts_with(b"![CDATA[") {
        return Some(5);
    }
    // Kind 4: declaration
    if rest.first() == Some(&b'!') && rest.get(1).is_some_and(|b| b.is_ascii_alphabetic()) {
        return Some(4);
    }
    // Kind 3: processing instruction
    if rest.first() == Some(&b'?') {
        return Some(3);
    }

    let (name_src, closing) = if rest.first() == Some(&b'/') {
        (&rest[1..], true)
    } else {
        (rest, false)
    };
    if let Some(name_len) = scan_tag_name(name_src) {
        let name = &name_src[..name_len];
        let after = name_src.get(name_len).copied();
        let terminated = match after {
            None => true,
            Some(b) if is_space_or_tab(b) || b == b'>' => true,
            Some(b'/') if name_src.get(name_len + 1) == Some(&b'>') => true,
            _ => false,
        };
        if terminated {
            // Kind 1: verbatim raw-text elements, open tags only.
            if !closing && name_in(name, &VERBATIM_TAGS) {
                return Some(1);
            }
            if name_in(name, &BLOCK_TAGS) {
                return Some(6);
            }
        }
    }
    None
}

/// Kind 7 start condition: the line is a complete open tag (any name but
/// the verbatim ones) or a complete closing tag, followed by nothing but
/// spaces and tabs.
pub fn html_block_start_7(s: &[u8]) -> bool {
    debug_assert_eq!(s.first(), Some(&b'<'));
    let end = if s.get(1) == Some(&b'/') {
        scan_close_tag(s, 0)
    } else {
        match scan_open_tag(s, 0) {
            Some(end) => {
                let name = &s[1..1 + scan_tag_name(&s[1..]).unwrap_or(0)];
                if name_in(name, &VERBATIM_TAGS) {
                    return false;
                }
                Some(end)
            }
            None => None,
        }
    };
    match end {
        Some(end) => s[end..].iter().all(|&b| is_space_or_tab(b)),
        None => false,
    }
}

/// Search for a byte sequence, case-sensitively.
fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    memchr::memmem::find(haystack, needle).is_some()
}

/// End condition for kinds 1-5, tested on the line's remaining text.
/// Kinds 6-7 end at a blank line instead (handled by the continuation
/// predicate).
pub fn html_block_end(html_type: u8, s: &[u8]) -> bool {
    match html_type {
        1 => VERBATIM_TAGS.iter().any(|tag| {
            // case-insensitive search for `</tag>`
            s.windows(tag.len() + 3).any(|w| {
                w.starts_with(b"</")
                    && w[2..w.len() - 1].eq_ignore_ascii_case(tag)
                    && w[w.len() - 1] == b'>'
            })
        }),
        2 => contains(s, b"-->"),
        3 => contains(s, b"?>"),
        4 => contains(s, b">"),
        5 => contains(s, b"]]>"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_1_verbatim() {
        assert_eq!(html_block_start(b"<pre>"), Some(1));
        assert_eq!(html_block_start(b"<script src=\"x\">"), Some(1));
        assert_eq!(html_block_start(b"<STYLE"), Some(1));
        assert_eq!(html_block_start(b"<textarea"), Some(1));
        // closing forms of the verbatim tags are not in the kind-6 list
        assert_eq!(html_block_start(b"</script>"), None);
    }

    #[test]
    fn test_kind_2_to_5() {
        assert_eq!(html_block_start(b"<!-- comment"), Some(2));
        assert_eq!(html_block_start(b"<?php"), Some(3));
        assert_eq!(html_block_start(b"<!DOCTYPE html"), Some(4));
        assert_eq!(html_block_start(b"<![CDATA[x"), Some(5));
    }

    #[test]
    fn test_kind_6() {
        assert_eq!(html_block_start(b"<div>"), Some(6));
        assert_eq!(html_block_start(b"<div"), Some(6));
        assert_eq!(html_block_start(b"<DIV CLASS=\"x\""), Some(6));
        assert_eq!(html_block_start(b"</div>"), Some(6));
        assert_eq!(html_block_start(b"<hr/>"), Some(6));
        assert_eq!(html_block_start(b"<divx"), None);
        assert_eq!(html_block_start(b"<span>"), None);
    }

    #[test]
    fn test_kind_7() {
        assert!(html_block_start_7(b"<a href=\"foo\">"));
        assert!(html_block_start_7(b"</span>  "));
        assert!(!html_block_start_7(b"<a href=\"foo\"> text"));
        assert!(!html_block_start_7(b"<pre>"));
        assert!(!html_block_start_7(b"<a href"));
    }

    #[test]
    fn test_end_conditions() {
        assert!(html_block_end(1, b"foo </script> bar"));
        assert!(html_block_end(1, b"</SCRIPT>"));
        assert!(!html_block_end(1, b"</scriptx>"));
        assert!(html_block_end(2, b"x --> y"));
        assert!(html_block_end(3, b"x ?> y"));
        assert!(html_block_end(4, b">"));
        assert!(html_block_end(5, b"]]>"));
        assert!(!html_block_end(2, b"--"));
    }
}
