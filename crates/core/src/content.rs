//! Content normalizer for stored entry markup.
//!
//! Every function here is pure. The store decides when a normalized value
//! must be written back.

use scraper::{ElementRef, Html, Node};

/// Legacy image host still referenced by old entries.
pub const LEGACY_IMAGE_HOST: &str = "imag.cf";

/// Replacement for [`LEGACY_IMAGE_HOST`].
pub const IMAGE_HOST: &str = "i.matdoes.dev";

/// Elements dropped entirely (including their children). Raw-text elements
/// are listed because their text is not entity-decoded on parse.
const STRIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "noscript", "xmp", "noembed", "noframes",
    "plaintext",
];

/// Elements whose first newline the parser swallows.
const NEWLINE_ELEMENTS: &[&str] = &["pre", "textarea", "listing"];

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements that end a line of text in plain-text and markdown projections.
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "pre",
    "tr", "table", "hr",
];

// ---------------------------------------------------------------------------
// HTML repair
// ---------------------------------------------------------------------------

/// Repair and sanitize stored markup.
///
/// The input is parsed as a body fragment, which closes unbalanced tags, and
/// serialized back. Scriptable elements, `on*` handler attributes, and
/// `javascript:` URLs are removed. Running it on its own output is a no-op.
pub fn fix_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());
    write_children(fragment.root_element(), &mut out);
    out
}

fn write_children(parent: ElementRef<'_>, out: &mut String) {
    for child in parent.children() {
        match child.value() {
            Node::Text(text) => escape_text(text, out),
            Node::Element(_) => {
                if let Some(element) = ElementRef::wrap(child) {
                    write_element(element, out);
                }
            }
            _ => {}
        }
    }
}

fn write_element(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    if STRIPPED_ELEMENTS.contains(&name) {
        return;
    }

    // Attribute order is not stable across parses; sort for deterministic output.
    let mut attrs: Vec<(&str, &str)> = element
        .value()
        .attrs()
        .filter(|(attr, value)| is_safe_attribute(attr, value))
        .collect();
    attrs.sort_unstable_by(|a, b| a.0.cmp(b.0));

    out.push('<');
    out.push_str(name);
    for (attr, value) in attrs {
        out.push(' ');
        out.push_str(attr);
        out.push_str("=\"");
        escape_attribute(value, out);
        out.push('"');
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&name) {
        return;
    }

    if NEWLINE_ELEMENTS.contains(&name) && starts_with_newline(element) {
        out.push('\n');
    }

    write_children(element, out);
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn starts_with_newline(element: ElementRef<'_>) -> bool {
    match element.first_child().map(|child| child.value()) {
        Some(Node::Text(text)) => text.starts_with('\n'),
        _ => false,
    }
}

fn is_safe_attribute(name: &str, value: &str) -> bool {
    if name.to_ascii_lowercase().starts_with("on") {
        return false;
    }
    let value = value.trim_start().to_ascii_lowercase();
    !value.starts_with("javascript:")
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

// ---------------------------------------------------------------------------
// Plain-text projection
// ---------------------------------------------------------------------------

/// Strip all markup, keeping visible text.
///
/// Block boundaries become a single space, whitespace runs collapse, and
/// the result is trimmed.
pub fn remove_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut raw = String::with_capacity(html.len());
    collect_text(fragment.root_element(), &mut raw);
    collapse_whitespace(&raw)
}

fn collect_text(parent: ElementRef<'_>, out: &mut String) {
    for child in parent.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                let Some(element) = ElementRef::wrap(child) else {
                    continue;
                };
                let name = element.value().name();
                if STRIPPED_ELEMENTS.contains(&name) {
                    continue;
                }
                collect_text(element, out);
                if BLOCK_ELEMENTS.contains(&name) {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ---------------------------------------------------------------------------
// Markdown projection (chat embeds)
// ---------------------------------------------------------------------------

/// Render markup as chat-flavoured markdown.
pub fn html_to_markdown(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());
    write_markdown(fragment.root_element(), &mut out);

    // Collapse runs of blank lines left behind by nested blocks.
    let mut result = String::with_capacity(out.len());
    let mut newlines = 0;
    for c in out.trim().chars() {
        if c == '\n' {
            newlines += 1;
            if newlines > 2 {
                continue;
            }
        } else {
            newlines = 0;
        }
        result.push(c);
    }
    result
}

fn write_markdown(parent: ElementRef<'_>, out: &mut String) {
    for child in parent.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                let Some(element) = ElementRef::wrap(child) else {
                    continue;
                };
                let name = element.value().name();
                match name {
                    _ if STRIPPED_ELEMENTS.contains(&name) => {}
                    "b" | "strong" => wrap_markdown(element, "**", out),
                    "i" | "em" => wrap_markdown(element, "*", out),
                    "u" => wrap_markdown(element, "__", out),
                    "s" | "strike" | "del" => wrap_markdown(element, "~~", out),
                    "code" => wrap_markdown(element, "`", out),
                    "br" => out.push('\n'),
                    "a" => {
                        let mut label = String::new();
                        write_markdown(element, &mut label);
                        match element.value().attr("href") {
                            Some(href) if is_safe_attribute("href", href) => {
                                out.push_str(&format!("[{label}]({href})"));
                            }
                            _ => out.push_str(&label),
                        }
                    }
                    "li" => {
                        out.push_str("• ");
                        write_markdown(element, out);
                        out.push('\n');
                    }
                    "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                        wrap_markdown(element, "**", out);
                        out.push('\n');
                    }
                    _ => {
                        write_markdown(element, out);
                        if BLOCK_ELEMENTS.contains(&name) {
                            out.push('\n');
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

fn wrap_markdown(element: ElementRef<'_>, marker: &str, out: &mut String) {
    out.push_str(marker);
    write_markdown(element, out);
    out.push_str(marker);
}

// ---------------------------------------------------------------------------
// Small string helpers
// ---------------------------------------------------------------------------

/// Point references at the legacy image host to the current one.
pub fn rewrite_legacy_image_host(src: &str) -> String {
    src.replace(LEGACY_IMAGE_HOST, IMAGE_HOST)
}

/// URL path form of an entry title, e.g. `"Cats and dogs"` -> `"Cats_and_dogs"`.
pub fn url_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| !matches!(c, '/' | '?' | '#'))
        .collect()
}

/// Truncate to at most `max` characters, marking the cut with `...`.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- fix_html ------------------------------------------------------------

    #[test]
    fn fix_html_keeps_well_formed_markup() {
        assert_eq!(
            fix_html("<p>Cats are <b>great</b></p>"),
            "<p>Cats are <b>great</b></p>"
        );
    }

    #[test]
    fn fix_html_closes_unbalanced_tags() {
        assert_eq!(fix_html("<p>open <i>italic"), "<p>open <i>italic</i></p>");
    }

    #[test]
    fn fix_html_drops_scripts_and_handlers() {
        let fixed = fix_html(
            r#"<p onclick="evil()">hi</p><script>alert(1)</script><a href="javascript:x()">l</a>"#,
        );
        assert_eq!(fixed, "<p>hi</p><a>l</a>");
    }

    #[test]
    fn fix_html_escapes_text() {
        assert_eq!(fix_html("1 &lt; 2 &amp; 3"), "1 &lt; 2 &amp; 3");
    }

    #[test]
    fn fix_html_drops_raw_text_elements() {
        assert_eq!(fix_html("<p>a</p><noscript>a<b</noscript><xmp>a&b</xmp>"), "<p>a</p>");
    }

    #[test]
    fn fix_html_keeps_leading_newline_in_pre() {
        assert_eq!(fix_html("<pre>\n\nx</pre>"), "<pre>\n\nx</pre>");
        assert_eq!(fix_html("<pre>\nx</pre>"), "<pre>x</pre>");
        assert_eq!(fix_html("<textarea>\n\nt</textarea>"), "<textarea>\n\nt</textarea>");
    }

    #[test]
    fn fix_html_is_idempotent() {
        let inputs = [
            "<p>Cats are great</p>",
            "<ul><li>one<li>two</ul>",
            r#"<img src="/a.png" alt="a &quot;b&quot;"><br>text"#,
            "<p><div>nested</div></p>",
            "plain & simple",
            "<noscript>a<b</noscript>",
            "<xmp>a&b</xmp>",
            "<noembed>x<y</noembed>",
            "<pre>\n\nx</pre>",
            "<textarea>\n\nt</textarea>",
            "<listing>\n\nl</listing>",
        ];
        for input in inputs {
            let once = fix_html(input);
            assert_eq!(fix_html(&once), once, "not idempotent for {input:?}");
        }
    }

    // -- remove_html ---------------------------------------------------------

    #[test]
    fn remove_html_spec_example() {
        assert_eq!(remove_html("<p>Cats are great</p>"), "Cats are great");
    }

    #[test]
    fn remove_html_separates_blocks() {
        assert_eq!(remove_html("<p>one</p><p>two</p>"), "one two");
        assert_eq!(remove_html("line<br>break"), "line break");
    }

    #[test]
    fn remove_html_joins_inline_runs() {
        assert_eq!(remove_html("<b>bo</b>ld"), "bold");
    }

    #[test]
    fn remove_html_ignores_script_text() {
        assert_eq!(remove_html("a<script>var x;</script>b"), "ab");
    }

    #[test]
    fn remove_html_decodes_entities() {
        assert_eq!(remove_html("fish &amp; chips"), "fish & chips");
    }

    // -- html_to_markdown ----------------------------------------------------

    #[test]
    fn markdown_inline_styles() {
        assert_eq!(
            html_to_markdown("<p><b>bold</b> and <i>it</i></p>"),
            "**bold** and *it*"
        );
    }

    #[test]
    fn markdown_links() {
        assert_eq!(
            html_to_markdown(r#"see <a href="https://x.dev">here</a>"#),
            "see [here](https://x.dev)"
        );
    }

    #[test]
    fn markdown_lists_and_breaks() {
        assert_eq!(
            html_to_markdown("<ul><li>a</li><li>b</li></ul>x<br>y"),
            "• a\n• b\n\nx\ny"
        );
    }

    // -- helpers -------------------------------------------------------------

    #[test]
    fn legacy_host_is_rewritten() {
        assert_eq!(
            rewrite_legacy_image_host("https://imag.cf/abc.png"),
            "https://i.matdoes.dev/abc.png"
        );
        assert_eq!(
            rewrite_legacy_image_host("https://example.com/abc.png"),
            "https://example.com/abc.png"
        );
    }

    #[test]
    fn url_title_replaces_whitespace() {
        assert_eq!(url_title("  Cats and   dogs "), "Cats_and_dogs");
        assert_eq!(url_title("What? A/B #1"), "What_AB_1");
    }

    #[test]
    fn truncate_leaves_short_text() {
        assert_eq!(truncate_chars("short", 10), "short");
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        assert_eq!(truncate_chars("ééééé", 4), "é...");
        assert_eq!(truncate_chars("abcdefgh", 5).chars().count(), 5);
    }
}
