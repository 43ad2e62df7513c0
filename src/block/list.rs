//! List marker recognition and tight/loose classification.

use super::parser::Parser;
use crate::limits;
use crate::scan::is_space_or_tab;
use crate::tree::{BlockId, BlockKind, BlockTree, ListData, ListKind};

/// Try to parse a list item marker at the parser's next-nonspace
/// position. On success the parser is advanced past the marker and its
/// following spaces, and the computed marker geometry is returned.
pub(crate) fn parse_list_marker(p: &mut Parser, container: BlockId) -> Option<ListData> {
    if p.indent >= 4 {
        return None;
    }
    let rest = &p.line[p.next_nonspace..];
    let interrupts_paragraph =
        matches!(p.tree.block(container).kind, BlockKind::Paragraph);

    let (kind, marker_len) = match rest.first()? {
        b'-' | b'+' | b'*' => (ListKind::Bullet { marker: rest[0] }, 1),
        b'0'..=b'9' => {
            let mut digits = 1;
            while digits < rest.len() && rest[digits].is_ascii_digit() {
                digits += 1;
            }
            if digits > limits::MAX_LIST_MARKER_DIGITS {
                return None;
            }
            let delimiter = match rest.get(digits) {
                Some(&d @ (b'.' | b')')) => d,
                _ => return None,
            };
            let start: u32 = std::str::from_utf8(&rest[..digits]).ok()?.parse().ok()?;
            if interrupts_paragraph && start != 1 {
                return None;
            }
            (ListKind::Ordered { start, delimiter }, digits + 1)
        }
        _ => return None,
    };

    // the marker must be followed by a space, tab, or end of line
    match rest.get(marker_len) {
        None => {}
        Some(&b) if is_space_or_tab(b) => {}
        _ => return None,
    }
    // an item with a blank first line cannot interrupt a paragraph
    if interrupts_paragraph && rest[marker_len..].iter().all(|&b| is_space_or_tab(b)) {
        return None;
    }

    let marker_offset = p.indent;
    p.advance_next_nonspace();
    p.advance_offset(marker_len, true);

    let spaces_start_col = p.column;
    let spaces_start_offset = p.offset;
    loop {
        p.advance_offset(1, true);
        let next = p.line.get(p.offset).copied();
        if p.column - spaces_start_col >= 5 || !next.is_some_and(is_space_or_tab) {
            break;
        }
    }
    let blank_item = p.line.get(p.offset).is_none();
    let spaces_after_marker = p.column - spaces_start_col;

    let padding = if !(1..5).contains(&spaces_after_marker) || blank_item {
        // rule #2: exactly one space belongs to the marker when the item
        // starts with indented code, a blank line, or 5+ spaces
        p.column = spaces_start_col;
        p.offset = spaces_start_offset;
        p.partially_consumed_tab = false;
        if p.line.get(p.offset).copied().is_some_and(is_space_or_tab) {
            p.advance_offset(1, true);
        }
        marker_len + 1
    } else {
        marker_len + spaces_after_marker
    };

    Some(ListData {
        kind,
        tight: true,
        marker_offset,
        padding,
    })
}

/// A chain of lists/items ends with a blank line if its deepest rightmost
/// descendant saw one.
fn ends_with_blank_line(tree: &BlockTree, mut id: BlockId) -> bool {
    loop {
        let block = tree.block(id);
        if block.last_line_blank {
            return true;
        }
        match block.kind {
            BlockKind::List(_) | BlockKind::Item(_) => match block.children.last() {
                Some(&last) => id = last,
                None => return false,
            },
            _ => return false,
        }
    }
}

/// Classify a closing list: loose if a blank line separates any two
/// items, or separates two block children inside one item.
pub(crate) fn list_is_tight(tree: &BlockTree, list: BlockId) -> bool {
    let items = &tree.block(list).children;
    for (i, &item) in items.iter().enumerate() {
        let item_is_last = i + 1 == items.len();
        if ends_with_blank_line(tree, item) && !item_is_last {
            return false;
        }
        let subitems = &tree.block(item).children;
        for (j, &sub) in subitems.iter().enumerate() {
            let sub_is_last = j + 1 == subitems.len();
            if ends_with_blank_line(tree, sub) && !(item_is_last && sub_is_last) {
                return false;
            }
        }
    }
    true
}
