//! Raw inline HTML tag scanning.
//!
//! Recognizes open/closing tags, comments, processing instructions,
//! declarations, and CDATA sections, per the CommonMark tag grammar.
//! Whitespace inside tags may include line endings.

use memchr::memmem;

#[inline]
fn is_tag_ws(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\x0b' | b'\x0c' | b'\r')
}

fn skip_tag_ws(s: &[u8], mut i: usize) -> usize {
    while i < s.len() && is_tag_ws(s[i]) {
        i += 1;
    }
    i
}

/// Scan a tag name at `i`: ASCII letter, then letters/digits/`-`.
fn scan_tag_name(s: &[u8], i: usize) -> Option<usize> {
    if !s.get(i)?.is_ascii_alphabetic() {
        return None;
    }
    let mut j = i + 1;
    while j < s.len() && (s[j].is_ascii_alphanumeric() || s[j] == b'-') {
        j += 1;
    }
    Some(j)
}

/// Scan an attribute name: `[A-Za-z_:]` then `[A-Za-z0-9_.:-]*`.
fn scan_attribute_name(s: &[u8], i: usize) -> Option<usize> {
    let first = *s.get(i)?;
    if !(first.is_ascii_alphabetic() || first == b'_' || first == b':') {
        return None;
    }
    let mut j = i + 1;
    while j < s.len()
        && (s[j].is_ascii_alphanumeric() || matches!(s[j], b'_' | b'.' | b':' | b'-'))
    {
        j += 1;
    }
    Some(j)
}

/// Scan an attribute value: unquoted, single-quoted, or double-quoted.
fn scan_attribute_value(s: &[u8], i: usize) -> Option<usize> {
    match s.get(i)? {
        b'\'' => {
            let close = memchr::memchr(b'\'', &s[i + 1..])?;
            Some(i + 1 + close + 1)
        }
        b'"' => {
            let close = memchr::memchr(b'"', &s[i + 1..])?;
            Some(i + 1 + close + 1)
        }
        _ => {
            let mut j = i;
            while j < s.len()
                && !is_tag_ws(s[j])
                && !matches!(s[j], b'"' | b'\'' | b'=' | b'<' | b'>' | b'`')
            {
                j += 1;
            }
            (j > i).then_some(j)
        }
    }
}

/// Scan a complete open tag starting at the `<` at `pos`.
/// Returns the position just past the closing `>`.
pub fn scan_open_tag(s: &[u8], pos: usize) -> Option<usize> {
    debug_assert_eq!(s.get(pos), Some(&b'<'));
    let mut i = scan_tag_name(s, pos + 1)?;
    loop {
        let ws_start = i;
        i = skip_tag_ws(s, i);
        match s.get(i) {
            Some(b'/') => {
                return (s.get(i + 1) == Some(&b'>')).then_some(i + 2);
            }
            Some(b'>') => return Some(i + 1),
            _ => {}
        }
        // an attribute requires at least one whitespace separator
        if i == ws_start {
            return None;
        }
        i = scan_attribute_name(s, i)?;
        let after_name = skip_tag_ws(s, i);
        if s.get(after_name) == Some(&b'=') {
            let value_start = skip_tag_ws(s, after_name + 1);
            i = scan_attribute_value(s, value_start)?;
        }
    }
}

/// Scan a complete closing tag starting at the `<` at `pos`.
pub fn scan_close_tag(s: &[u8], pos: usize) -> Option<usize> {
    debug_assert_eq!(s.get(pos), Some(&b'<'));
    if s.get(pos + 1) != Some(&b'/') {
        return None;
    }
    let i = scan_tag_name(s, pos + 2)?;
    let i = skip_tag_ws(s, i);
    (s.get(i) == Some(&b'>')).then_some(i + 1)
}

/// Scan any raw inline HTML construct at the `<` at `pos`.
/// Returns the position just past the construct.
pub fn scan_html_inline(s: &[u8], pos: usize) -> Option<usize> {
    debug_assert_eq!(s.get(pos), Some(&b'<'));
    match s.get(pos + 1) {
        Some(b'/') => scan_close_tag(s, pos),
        Some(b'?') => {
            // processing instruction: shortest match to `?>`
            memmem::find(&s[pos + 2..], b"?>").map(|i| pos + 2 + i + 2)
        }
        Some(b'!') => {
            let rest = &s[pos + 2..];
            if rest.starts_with(b"-->") {
                // `<!-->`
                Some(pos + 5)
            } else if rest.starts_with(b"--->") {
                // `<!--->`
                Some(pos + 6)
            } else if rest.starts_with(b"--") {
                memmem::find(&rest[2..], b"-->").map(|i| pos + 4 + i + 3)
            } else if rest.starts_with(b"[CDATA[") {
                memmem::find(&rest[7..], b"]]>").map(|i| pos + 9 + i + 3)
            } else if rest.first().is_some_and(|b| b.is_ascii_alphabetic()) {
                // declaration
                memchr::memchr(b'>', rest).map(|i| pos + 2 + i + 1)
            } else {
                None
            }
        }
        _ => scan_open_tag(s, pos),
    }
}
