//! Engine-level properties: determinism, idempotent re-rendering, and
//! no panics on arbitrary input.

use arbormark::{parse, render_html, to_html};
use proptest::prelude::*;

proptest! {
    #[test]
    fn rendering_is_deterministic(input in ".{0,400}") {
        prop_assert_eq!(to_html(&input), to_html(&input));
    }

    #[test]
    fn rendering_the_tree_twice_is_identical(input in ".{0,400}") {
        let doc = parse(&input);
        prop_assert_eq!(render_html(&doc), render_html(&doc));
    }

    #[test]
    fn never_panics_on_markdown_ish_input(
        input in "[-*_#>\\[\\]()`~ \t\na-z0-9!&<\"']{0,400}"
    ) {
        let _ = to_html(&input);
    }

    #[test]
    fn output_is_valid_utf8_and_final_newline_terminated(input in "[a-z #>*`\n-]{1,200}") {
        let html = to_html(&input);
        // any non-empty output ends with a newline
        if !html.is_empty() {
            prop_assert!(html.ends_with('\n'));
        }
    }
}

#[test]
fn duplicate_definitions_first_wins() {
    assert_eq!(
        to_html("[foo]\n\n[foo]: first\n[foo]: second"),
        "<p><a href=\"first\">foo</a></p>\n"
    );
}

#[test]
fn entity_and_literal_render_identically() {
    assert_eq!(to_html("&amp;"), to_html("&"));
    assert_eq!(to_html("&#42;"), to_html("\\*"));
}

#[test]
fn tab_behaves_as_four_column_stop() {
    assert_eq!(to_html(">\t\tfoo"), to_html(">       foo"));
    assert_eq!(to_html("\tfoo"), to_html("    foo"));
}

#[test]
fn crlf_and_lf_agree() {
    let lf = "# a\n\n- b\n- c\n\n> d\n";
    let crlf = lf.replace('\n', "\r\n");
    assert_eq!(to_html(lf), to_html(&crlf));
}

#[test]
fn nul_bytes_are_replaced() {
    let html = to_html("a\u{0}b");
    assert_eq!(html, "<p>a\u{fffd}b</p>\n");
}
