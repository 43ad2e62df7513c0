//! Logical line splitting.
//!
//! Lines end at `\n`, `\r\n`, or a lone `\r`; the terminator is not part
//! of the yielded line. U+0000 is replaced with U+FFFD before any other
//! processing, per the CommonMark insecure-character rule.

use memchr::{memchr, memchr2};
use std::borrow::Cow;

/// Iterator over the logical lines of a document.
pub struct LineReader<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> LineReader<'a> {
    /// Create a reader over the whole document.
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// Next logical line, without its terminator.
    pub fn next_line(&mut self) -> Option<Cow<'a, [u8]>> {
        if self.pos >= self.input.len() {
            return None;
        }
        let rest = &self.input[self.pos..];
        let (line, consumed) = match memchr2(b'\n', b'\r', rest) {
            Some(i) => {
                let mut consumed = i + 1;
                if rest[i] == b'\r' && rest.get(i + 1) == Some(&b'\n') {
                    consumed += 1;
                }
                (&rest[..i], consumed)
            }
            None => (rest, rest.len()),
        };
        self.pos += consumed;
        Some(replace_nul(line))
    }
}

impl<'a> Iterator for LineReader<'a> {
    type Item = Cow<'a, [u8]>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line()
    }
}

/// U+FFFD replacement character, UTF-8 encoded.
const REPLACEMENT: &[u8] = b"\xef\xbf\xbd";

fn replace_nul(line: &[u8]) -> Cow<'_, [u8]> {
    match memchr(0, line) {
        None => Cow::Borrowed(line),
        Some(first) => {
            let mut out = Vec::with_capacity(line.len() + 2);
            out.extend_from_slice(&line[..first]);
            for &b in &line[first..] {
                if b == 0 {
                    out.extend_from_slice(REPLACEMENT);
                } else {
                    out.push(b);
                }
            }
            Cow::Owned(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(input: &[u8]) -> Vec<Vec<u8>> {
        LineReader::new(input).map(|l| l.into_owned()).collect()
    }

    #[test]
    fn test_lf_lines() {
        assert_eq!(collect(b"a\nb\nc"), vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn test_trailing_newline_no_extra_line() {
        assert_eq!(collect(b"a\n"), vec![b"a".to_vec()]);
    }

    #[test]
    fn test_crlf_and_cr() {
        assert_eq!(collect(b"a\r\nb\rc"), vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn test_blank_lines_preserved() {
        assert_eq!(collect(b"a\n\nb"), vec![b"a".to_vec(), b"".to_vec(), b"b".to_vec()]);
    }

    #[test]
    fn test_nul_replacement() {
        assert_eq!(collect(b"a\0b"), vec![b"a\xef\xbf\xbdb".to_vec()]);
    }

    #[test]
    fn test_empty_input() {
        assert!(collect(b"").is_empty());
    }
}
