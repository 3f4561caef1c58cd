// src/stages/html.rs

//! HTML minification: comment removal and whitespace collapsing.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Elements whose content is whitespace-sensitive or not HTML.
static PRESERVED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)<pre\b.*?</pre\s*>|<textarea\b.*?</textarea\s*>|<script\b.*?</script\s*>|<style\b.*?</style\s*>",
    )
    .expect("preserved-element regex is valid")
});

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment regex is valid"));

static BETWEEN_TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">\s+<").expect("between-tags regex is valid"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));

/// Elements that start on their own line, so whitespace around them never
/// renders.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "head",
    "header", "hr", "html", "li", "link", "main", "meta", "nav", "ol", "p", "section", "table",
    "tbody", "td", "tfoot", "th", "thead", "title", "tr", "ul",
];

/// Minify an HTML document.
///
/// Comments are removed except IE conditional comments. Whitespace between
/// two block-level tags is dropped; any other run of whitespace becomes a
/// single space. `pre`, `textarea`, `script` and `style` elements
/// are copied verbatim.
pub fn minify(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut last = 0;

    for m in PRESERVED.find_iter(html) {
        out.push_str(&minify_fragment(&html[last..m.start()]));
        out.push_str(m.as_str());
        last = m.end();
    }
    out.push_str(&minify_fragment(&html[last..]));

    out.trim().to_string()
}

fn minify_fragment(fragment: &str) -> String {
    let without_comments = COMMENT.replace_all(fragment, |caps: &Captures| {
        let comment = &caps[0];
        if comment.starts_with("<!--[if") {
            comment.to_string()
        } else {
            String::new()
        }
    });

    let text: &str = &without_comments;
    let mut tags_joined = String::with_capacity(text.len());
    let mut last = 0;
    for m in BETWEEN_TAGS.find_iter(text) {
        tags_joined.push_str(&text[last..m.start()]);
        let before = is_block_tag(tag_before(&text[..m.start()]));
        let after = is_block_tag(tag_after(&text[m.end() - 1..]));
        tags_joined.push_str(if before && after { "><" } else { "> <" });
        last = m.end();
    }
    tags_joined.push_str(&text[last..]);

    WHITESPACE.replace_all(&tags_joined, " ").into_owned()
}

/// Name of the tag closed by the `>` ending `text`.
fn tag_before(text: &str) -> &str {
    match text.rfind('<') {
        Some(open) => tag_name(&text[open + 1..]),
        None => "",
    }
}

/// Name of the tag opened by the `<` starting `text`.
fn tag_after(text: &str) -> &str {
    tag_name(text.get(1..).unwrap_or(""))
}

fn tag_name(text: &str) -> &str {
    let text = text.strip_prefix('/').unwrap_or(text);
    let end = text
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(text.len());
    &text[..end]
}

/// Doctypes and conditional comments count as block-level.
fn is_block_tag(name: &str) -> bool {
    name.is_empty() || BLOCK_TAGS.iter().any(|tag| tag.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_comments_and_line_breaks_between_tags() {
        let html = "<ul>\n  <!-- nav -->\n  <li>One</li>\n  <li>Two</li>\n</ul>\n";
        assert_eq!(minify(html), "<ul><li>One</li><li>Two</li></ul>");
    }

    #[test]
    fn keeps_single_space_between_inline_tags() {
        assert_eq!(minify("<b>a</b>   <i>b</i>"), "<b>a</b> <i>b</i>");
        assert_eq!(minify("<a>x</a>\n<a>y</a>"), "<a>x</a> <a>y</a>");
    }

    #[test]
    fn inline_next_to_block_keeps_a_space() {
        assert_eq!(
            minify("<div>\n  <span>a</span>\n  <p>b</p>\n</div>"),
            "<div> <span>a</span> <p>b</p></div>"
        );
    }

    #[test]
    fn preserves_pre_and_conditional_comments() {
        let html = "<pre>  keep\n  this </pre>\n<!--[if IE]><p>old</p><![endif]-->";
        let out = minify(html);
        assert!(out.starts_with("<pre>  keep\n  this </pre>"));
        assert!(out.contains("<!--[if IE]>"));
    }
}
