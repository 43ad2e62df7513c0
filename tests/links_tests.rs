//! Links, images, reference resolution, and autolinks.

use arbormark::to_html;

#[track_caller]
fn check(input: &str, expected: &str) {
    assert_eq!(to_html(input), expected, "input: {input:?}");
}

#[test]
fn inline_links() {
    check(
        "[link](/uri \"title\")",
        "<p><a href=\"/uri\" title=\"title\">link</a></p>\n",
    );
    check("[link](/uri)", "<p><a href=\"/uri\">link</a></p>\n");
    check("[link]()", "<p><a href=\"\">link</a></p>\n");
    check("[link](<>)", "<p><a href=\"\">link</a></p>\n");
    check("[link](/my uri)", "<p>[link](/my uri)</p>\n");
    check("[link](</my uri>)", "<p><a href=\"/my%20uri\">link</a></p>\n");
}

#[test]
fn link_destinations() {
    check(
        "[link](foo(and(bar)))",
        "<p><a href=\"foo(and(bar))\">link</a></p>\n",
    );
    check(
        "[link](foo\\(and\\(bar\\))",
        "<p><a href=\"foo(and(bar)\">link</a></p>\n",
    );
    check(
        "[link](<foo(and(bar)>)",
        "<p><a href=\"foo(and(bar)\">link</a></p>\n",
    );
    check("[link](\"title\")", "<p><a href=\"%22title%22\">link</a></p>\n");
    check(
        "[link](/url \"title \\\"&quot;\")",
        "<p><a href=\"/url\" title=\"title &quot;&quot;\">link</a></p>\n",
    );
    check(
        "[link](foo%20b&auml;)",
        "<p><a href=\"foo%20b%C3%A4\">link</a></p>\n",
    );
}

#[test]
fn link_titles() {
    check(
        "[link](/url 'title')",
        "<p><a href=\"/url\" title=\"title\">link</a></p>\n",
    );
    check(
        "[link](/url (title))",
        "<p><a href=\"/url\" title=\"title\">link</a></p>\n",
    );
    check(
        "[link](/url\n\"title\")",
        "<p><a href=\"/url\" title=\"title\">link</a></p>\n",
    );
}

#[test]
fn reference_links() {
    check(
        "[foo][bar]\n\n[bar]: /url \"title\"",
        "<p><a href=\"/url\" title=\"title\">foo</a></p>\n",
    );
    check(
        "[foo][]\n\n[foo]: /url",
        "<p><a href=\"/url\">foo</a></p>\n",
    );
    check("[foo]\n\n[foo]: /url", "<p><a href=\"/url\">foo</a></p>\n");
    check("[Foo]\n\n[foo]: /url", "<p><a href=\"/url\">Foo</a></p>\n");
    check(
        "[foo] [bar]\n\n[foo]: /u1\n[bar]: /u2",
        "<p><a href=\"/u1\">foo</a> <a href=\"/u2\">bar</a></p>\n",
    );
    check("[foo][nope]\n\n[foo]: /url", "<p>[foo][nope]</p>\n");
    check("[nope]", "<p>[nope]</p>\n");
}

#[test]
fn links_cannot_nest() {
    check(
        "[foo [bar](/uri)](/uri)",
        "<p>[foo <a href=\"/uri\">bar</a>](/uri)</p>\n",
    );
}

#[test]
fn emphasis_in_link_text() {
    check(
        "[foo *bar*](/uri)",
        "<p><a href=\"/uri\">foo <em>bar</em></a></p>\n",
    );
    check(
        "*foo [bar](/uri)*",
        "<p><em>foo <a href=\"/uri\">bar</a></em></p>\n",
    );
}

#[test]
fn images() {
    check(
        "![foo](/url \"title\")",
        "<p><img src=\"/url\" alt=\"foo\" title=\"title\" /></p>\n",
    );
    check(
        "![foo *bar*](/url)",
        "<p><img src=\"/url\" alt=\"foo bar\" /></p>\n",
    );
    check(
        "![foo ![bar](/u1)](/u2)",
        "<p><img src=\"/u2\" alt=\"foo bar\" /></p>\n",
    );
    check(
        "![foo [bar](/u1)](/u2)",
        "<p><img src=\"/u2\" alt=\"foo bar\" /></p>\n",
    );
    check(
        "![foo][bar]\n\n[bar]: /url",
        "<p><img src=\"/url\" alt=\"foo\" /></p>\n",
    );
    check("my ![foo bar](/path/to/train.jpg  \"title\"   )",
        "<p>my <img src=\"/path/to/train.jpg\" alt=\"foo bar\" title=\"title\" /></p>\n",
    );
}

#[test]
fn images_do_not_deactivate_links() {
    // an image inside link text is fine; a link is not
    check(
        "[![moon](moon.jpg)](/uri)",
        "<p><a href=\"/uri\"><img src=\"moon.jpg\" alt=\"moon\" /></a></p>\n",
    );
}

#[test]
fn uri_autolinks() {
    check(
        "<http://foo.bar.baz>",
        "<p><a href=\"http://foo.bar.baz\">http://foo.bar.baz</a></p>\n",
    );
    check(
        "<irc://foo.bar:2233/baz>",
        "<p><a href=\"irc://foo.bar:2233/baz\">irc://foo.bar:2233/baz</a></p>\n",
    );
    check(
        "<MAILTO:FOO@BAR.BAZ>",
        "<p><a href=\"MAILTO:FOO@BAR.BAZ\">MAILTO:FOO@BAR.BAZ</a></p>\n",
    );
    check("<http://foo.bar/baz bim>", "<p>&lt;http://foo.bar/baz bim&gt;</p>\n");
    check(
        "<http://example.com/\\[\\>",
        "<p><a href=\"http://example.com/%5C%5B%5C\">http://example.com/\\[\\</a></p>\n",
    );
}

#[test]
fn email_autolinks() {
    check(
        "<foo@bar.example.com>",
        "<p><a href=\"mailto:foo@bar.example.com\">foo@bar.example.com</a></p>\n",
    );
    check(
        "<foo+special@Bar.baz-bar0.com>",
        "<p><a href=\"mailto:foo+special@Bar.baz-bar0.com\">foo+special@Bar.baz-bar0.com</a></p>\n",
    );
    check("<foo\\+@bar.example.com>", "<p>&lt;foo+@bar.example.com&gt;</p>\n");
    check("<>", "<p>&lt;&gt;</p>\n");
    check("<m:abc>", "<p>&lt;m:abc&gt;</p>\n");
}
