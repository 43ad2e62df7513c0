//! Code spans.
//!
//! A backtick run opens a code span only if a run of exactly the same
//! length appears later; otherwise the run stays literal. Resolution is
//! eager and takes precedence over every delimiter found inside.

use crate::limits;

/// Try to close a code span whose opening run of `ticks` backticks starts
/// at `pos`. Returns the position just past the closing run and the
/// normalized content.
pub(crate) fn scan_code_span(subject: &[u8], pos: usize, ticks: usize) -> Option<(usize, String)> {
    debug_assert_eq!(subject.get(pos), Some(&b'`'));
    if ticks > limits::MAX_CODE_SPAN_BACKTICKS {
        return None;
    }
    let content_start = pos + ticks;
    let mut i = content_start;
    while i < subject.len() {
        match memchr::memchr(b'`', &subject[i..]) {
            None => return None,
            Some(off) => {
                let run_start = i + off;
                let mut run_len = 0;
                while subject.get(run_start + run_len) == Some(&b'`') {
                    run_len += 1;
                }
                if run_len == ticks {
                    let content = normalize(&subject[content_start..run_start]);
                    return Some((run_start + run_len, content));
                }
                i = run_start + run_len;
            }
        }
    }
    None
}

/// Line endings become spaces; if the result starts and ends with a space
/// and is not all spaces, one space is stripped from each end.
fn normalize(raw: &[u8]) -> String {
    let mut content: Vec<u8> = raw
        .iter()
        .map(|&b| if b == b'\n' { b' ' } else { b })
        .collect();
    if content.len() >= 2
        && content.first() == Some(&b' ')
        && content.last() == Some(&b' ')
        && content.iter().any(|&b| b != b' ')
    {
        content.pop();
        content.remove(0);
    }
    String::from_utf8_lossy(&content).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(s: &str) -> Option<(usize, String)> {
        let mut ticks = 0;
        while s.as_bytes().get(ticks) == Some(&b'`') {
            ticks += 1;
        }
        scan_code_span(s.as_bytes(), 0, ticks)
    }

    #[test]
    fn test_simple_span() {
        assert_eq!(scan("`foo`"), Some((5, "foo".to_string())));
    }

    #[test]
    fn test_double_backtick_span() {
        assert_eq!(scan("``foo ` bar``"), Some((13, "foo ` bar".to_string())));
    }

    #[test]
    fn test_space_stripping() {
        assert_eq!(scan("`` `foo` ``"), Some((11, "`foo`".to_string())));
        assert_eq!(scan("` b `"), Some((5, "b".to_string())));
        // all spaces are kept
        assert_eq!(scan("`  `"), Some((4, "  ".to_string())));
    }

    #[test]
    fn test_newline_becomes_space() {
        assert_eq!(scan("`foo\nbar`"), Some((9, "foo bar".to_string())));
    }

    #[test]
    fn test_unmatched_run() {
        assert_eq!(scan("``foo`"), None);
        assert_eq!(scan("`foo"), None);
    }

    #[test]
    fn test_longer_inner_run_skipped() {
        // the ``` run inside cannot close a ` span
        assert_eq!(scan("`a```b`"), Some((7, "a```b".to_string())));
    }
}
