//! Backslash escapes and character references.
//!
//! Named entities go through the HTML5 entity table provided by the
//! `html-escape` crate; the engine itself only validates the reference
//! shape. Numeric references are decoded here because CommonMark pins
//! exact digit caps and U+FFFD fallbacks that a generic decoder does not
//! guarantee.

use crate::limits;
use crate::scan::is_ascii_punctuation;

/// Decode the character reference starting at `pos` (which must point at
/// a `&`). Returns the decoded text and the number of bytes consumed,
/// or None if the bytes do not form a valid reference.
pub fn decode_entity(bytes: &[u8], pos: usize) -> Option<(String, usize)> {
    debug_assert_eq!(bytes.get(pos), Some(&b'&'));
    let rest = &bytes[pos + 1..];
    if rest.first() == Some(&b'#') {
        decode_numeric(&rest[1..]).map(|(ch, digits)| {
            // `&#` + digits + `;`
            (ch.to_string(), digits + 3)
        })
    } else {
        decode_named(rest).map(|(s, name_len)| (s, name_len + 2))
    }
}

/// Decode `&name;` against the HTML5 entity table.
/// Returns the decoded text and the length of `name`.
fn decode_named(rest: &[u8]) -> Option<(String, usize)> {
    let mut len = 0;
    while len < rest.len() && len <= limits::MAX_ENTITY_NAME && rest[len].is_ascii_alphanumeric() {
        len += 1;
    }
    if len == 0 || len > limits::MAX_ENTITY_NAME || rest.get(len) != Some(&b';') {
        return None;
    }
    let name = std::str::from_utf8(&rest[..len]).ok()?;
    let candidate = format!("&{name};");
    let decoded = html_escape::decode_html_entities(&candidate);
    if decoded == candidate {
        return None;
    }
    Some((decoded.into_owned(), len))
}

/// Decode the digits of `&#...;` / `&#x...;`, without the `&#` prefix.
/// Returns the character and the length of the digit part (including any
/// `x`/`X` marker).
fn decode_numeric(rest: &[u8]) -> Option<(char, usize)> {
    let (radix, max_digits, skip) = match rest.first() {
        Some(b'x') | Some(b'X') => (16u32, limits::MAX_HEX_ENTITY_DIGITS, 1),
        _ => (10u32, limits::MAX_DEC_ENTITY_DIGITS, 0),
    };
    let digits = &rest[skip..];
    let mut value: u32 = 0;
    let mut count = 0;
    while count < digits.len() {
        let d = match (digits[count] as char).to_digit(radix) {
            Some(d) => d,
            None => break,
        };
        if count >= max_digits {
            return None;
        }
        value = value.saturating_mul(radix).saturating_add(d);
        count += 1;
    }
    if count == 0 || digits.get(count) != Some(&b';') {
        return None;
    }
    let ch = match value {
        0 => '\u{fffd}',
        v => char::from_u32(v).unwrap_or('\u{fffd}'),
    };
    Some((ch, skip + count))
}

/// Resolve backslash escapes and character references in a raw span.
///
/// Used for link destinations, titles, labels, and code fence info
/// strings — everywhere except code and raw-HTML contexts.
pub fn unescape_string(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if i + 1 < bytes.len() && is_ascii_punctuation(bytes[i + 1]) => {
                out.push(bytes[i + 1]);
                i += 2;
            }
            b'&' => {
                if let Some((text, len)) = decode_entity(bytes, i) {
                    out.extend_from_slice(text.as_bytes());
                    i += len;
                } else {
                    out.push(b'&');
                    i += 1;
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(s: &str) -> Option<(String, usize)> {
        decode_entity(s.as_bytes(), 0)
    }

    #[test]
    fn test_named_entities() {
        assert_eq!(decode("&amp;"), Some(("&".to_string(), 5)));
        assert_eq!(decode("&auml;"), Some(("ä".to_string(), 6)));
        assert_eq!(decode("&AMP;"), Some(("&".to_string(), 5)));
    }

    #[test]
    fn test_unknown_name_stays_literal() {
        assert_eq!(decode("&MadeUpEntity;"), None);
        assert_eq!(decode("&;"), None);
        assert_eq!(decode("&amp"), None);
    }

    #[test]
    fn test_decimal_references() {
        assert_eq!(decode("&#35;"), Some(("#".to_string(), 5)));
        assert_eq!(decode("&#1234;"), Some(("Ӓ".to_string(), 7)));
    }

    #[test]
    fn test_hex_references() {
        assert_eq!(decode("&#X22;"), Some(("\"".to_string(), 6)));
        assert_eq!(decode("&#xD06;"), Some(("ആ".to_string(), 7)));
    }

    #[test]
    fn test_invalid_numeric_becomes_replacement() {
        assert_eq!(decode("&#0;"), Some(("\u{fffd}".to_string(), 4)));
        assert_eq!(decode("&#xD800;"), Some(("\u{fffd}".to_string(), 8)));
        assert_eq!(decode("&#987654321;"), None); // too many digits
        assert_eq!(decode("&#1234567;"), Some(("\u{fffd}".to_string(), 10)));
    }

    #[test]
    fn test_not_a_reference() {
        assert_eq!(decode("&#;"), None);
        assert_eq!(decode("&#x;"), None);
        assert_eq!(decode("&#abc;"), None);
    }

    #[test]
    fn test_unescape_string() {
        assert_eq!(unescape_string(b"a\\*b"), b"a*b".to_vec());
        assert_eq!(unescape_string(b"a\\b"), b"a\\b".to_vec());
        assert_eq!(unescape_string(b"x &amp; y"), b"x & y".to_vec());
        assert_eq!(unescape_string(b"&MadeUp; \\["), b"&MadeUp; [".to_vec());
    }
}
