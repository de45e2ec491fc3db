//! Markdown-to-HTML rendering: an ordered sequence of substitutions.
//!
//! This is not a general Markdown parser. A constrained subset is rendered
//! through regex substitutions applied greedily across the whole text, in a
//! fixed order. Bold must run before italic: the double-asterisk markers
//! would otherwise be split by the single-asterisk rule. Images must run
//! before links for the same reason (`![..](..)` contains `[..](..)`).
//!
//! Supported constructs: ATX headings level 1-3, `>` block quotes, bold,
//! italic, images, links (opened in a new tab), and a trailing-newline
//! line break.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_H1: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^# (.*)$").unwrap());
static RE_H2: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^## (.*)$").unwrap());
static RE_H3: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^### (.*)$").unwrap());
static RE_BLOCKQUOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^> (.*)$").unwrap());
static RE_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*)\*\*").unwrap());
static RE_ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.*)\*").unwrap());
static RE_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[(.*?)\]\((.*?)\)").unwrap());
static RE_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(.*?)\]\((.*?)\)").unwrap());
static RE_TRAILING_NEWLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)\n$").unwrap());

/// Render the Markdown subset to HTML.
pub fn render_html(markdown: &str) -> String {
    let s = RE_H1.replace_all(markdown, "<h1>${1}</h1>");
    let s = RE_H2.replace_all(&s, "<h2>${1}</h2>");
    let s = RE_H3.replace_all(&s, "<h3>${1}</h3>");
    let s = RE_BLOCKQUOTE.replace_all(&s, "<blockquote>${1}</blockquote>");
    let s = RE_BOLD.replace_all(&s, "<strong>${1}</strong>");
    let s = RE_ITALIC.replace_all(&s, "<em>${1}</em>");
    let s = RE_IMAGE.replace_all(&s, "<img alt='${1}' src='${2}' />");
    let s = RE_LINK.replace_all(&s, "<a href='${2}' target='_blank'>${1}</a>");
    RE_TRAILING_NEWLINE.replace_all(&s, "<br />").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_bold_and_italic_in_order() {
        let html = render_html("# Hi\n**bold** and *em*");
        let h1 = html.find("<h1>Hi</h1>").expect("h1 missing");
        let strong = html.find("<strong>bold</strong>").expect("strong missing");
        let em = html.find("<em>em</em>").expect("em missing");
        assert!(h1 < strong && strong < em, "got: {html}");
    }

    #[test]
    fn heading_levels_do_not_collide() {
        let html = render_html("# One\n## Two\n### Three");
        assert!(html.contains("<h1>One</h1>"));
        assert!(html.contains("<h2>Two</h2>"));
        assert!(html.contains("<h3>Three</h3>"));
    }

    #[test]
    fn block_quotes_wrap_per_line() {
        let html = render_html("> quoted\nplain");
        assert!(html.contains("<blockquote>quoted</blockquote>"));
        assert!(html.contains("plain"));
    }

    #[test]
    fn bold_runs_before_italic() {
        // Applying italic first would split the double markers.
        let html = render_html("**strong**");
        assert_eq!(html, "<strong>strong</strong>");
    }

    #[test]
    fn images_render_before_links() {
        let html = render_html("![logo](pic.png) and [site](https://example.com)");
        assert!(html.contains("<img alt='logo' src='pic.png' />"), "got: {html}");
        assert!(
            html.contains("<a href='https://example.com' target='_blank'>site</a>"),
            "got: {html}"
        );
    }

    #[test]
    fn trailing_newline_becomes_line_break() {
        assert_eq!(render_html("line\n"), "line<br />");
        assert_eq!(render_html("line"), "line");
    }
}
