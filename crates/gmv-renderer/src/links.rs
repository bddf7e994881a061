//! Cross-reference tokens and bare URL autolinking.
//!
//! A cross-reference is `[[target]]` or `[[target|Display]]`. The target is
//! slugified to build a `/pages/{slug}` link; the display text (or the target
//! when no alias is given) becomes the visible text.

use std::borrow::Cow;
use std::fmt::Write;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::classes::ClassMap;
use crate::slug::slugify;
use crate::state::escape_html;

/// Extra class carried by anchors generated from cross-references.
pub const CROSS_REFERENCE_CLASS: &str = "gm-wikilink";

static WIKILINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\[\]|\n]+)(?:\|([^\[\]\n]*))?\]\]").unwrap());

/// Bare `http://` and `https://` URLs only. Schemeless hosts (`www.x.org`)
/// stay plain text; trailing punctuation is removed by [`trim_url`].
static BARE_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"]+"#).unwrap());

/// A `[[target]]` or `[[target|Display]]` token found in text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CrossReference {
    /// Referenced document name, trimmed.
    pub target: String,
    /// Alias after `|`, trimmed. `None` when absent or blank.
    pub display: Option<String>,
    /// Byte range of the whole token in the scanned text.
    pub range: Range<usize>,
}

impl CrossReference {
    /// Visible text: the alias if present, otherwise the target.
    #[must_use]
    pub fn display_text(&self) -> &str {
        self.display.as_deref().unwrap_or(&self.target)
    }

    /// Page slug derived from the target.
    #[must_use]
    pub fn slug(&self) -> String {
        slugify(&self.target)
    }
}

/// Find all cross-reference tokens in `text`, in order of appearance.
///
/// Tokens whose target is blank are ignored.
#[must_use]
pub fn cross_references(text: &str) -> Vec<CrossReference> {
    WIKILINK_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let target = caps.get(1)?.as_str().trim();
            if target.is_empty() {
                return None;
            }
            let display = caps
                .get(2)
                .map(|m| m.as_str().trim())
                .filter(|s| !s.is_empty())
                .map(str::to_owned);
            Some(CrossReference {
                target: target.to_owned(),
                display,
                range: whole.range(),
            })
        })
        .collect()
}

/// Replace every cross-reference token with its display text.
///
/// ```
/// use gmv_renderer::strip_cross_references;
///
/// assert_eq!(strip_cross_references("Meet [[Vex|the Mage]]"), "Meet the Mage");
/// ```
#[must_use]
pub fn strip_cross_references(text: &str) -> Cow<'_, str> {
    let refs = cross_references(text);
    if refs.is_empty() {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for reference in &refs {
        out.push_str(&text[last..reference.range.start]);
        out.push_str(reference.display_text());
        last = reference.range.end;
    }
    out.push_str(&text[last..]);
    Cow::Owned(out)
}

/// Render a literal text span to HTML.
///
/// Escapes the text, rewrites cross-references to anchors and autolinks bare
/// `http(s)://` URLs. Inside an existing link (`in_link`), cross-references
/// collapse to their escaped display text and URLs are left alone.
pub(crate) fn render_text(text: &str, base_url: &str, classes: &ClassMap, in_link: bool) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut last = 0;

    for reference in cross_references(text) {
        push_plain(&mut out, &text[last..reference.range.start], classes, in_link);
        let display = escape_html(reference.display_text());
        if in_link {
            out.push_str(&display);
        } else {
            write!(
                out,
                r#"<a class="{} {CROSS_REFERENCE_CLASS}" href="{}">{display}</a>"#,
                escape_html(&classes.link),
                escape_html(&page_url(base_url, &reference.slug())),
            )
            .unwrap();
        }
        last = reference.range.end;
    }

    push_plain(&mut out, &text[last..], classes, in_link);
    out
}

/// URL of a rendered page: `{base}/pages/{slug}`.
#[must_use]
pub fn page_url(base_url: &str, slug: &str) -> String {
    format!("{}/pages/{slug}", base_url.trim_end_matches('/'))
}

/// Escape text, turning bare URLs into anchors unless inside a link.
fn push_plain(out: &mut String, text: &str, classes: &ClassMap, in_link: bool) {
    if in_link {
        out.push_str(&escape_html(text));
        return;
    }

    let mut last = 0;
    for found in BARE_URL_RE.find_iter(text) {
        let url = trim_url(found.as_str());
        let end = found.start() + url.len();
        out.push_str(&escape_html(&text[last..found.start()]));
        let url = escape_html(url);
        write!(
            out,
            r#"<a class="{}" href="{url}">{url}</a>"#,
            escape_html(&classes.link)
        )
        .unwrap();
        last = end;
    }
    out.push_str(&escape_html(&text[last..]));
}

/// Drop trailing sentence punctuation and unbalanced closing parentheses.
fn trim_url(url: &str) -> &str {
    let mut url = url;
    loop {
        let Some(last) = url.chars().last() else {
            return url;
        };
        let trim = match last {
            '.' | ',' | ';' | ':' | '!' | '?' | '\'' => true,
            ')' => url.matches('(').count() < url.matches(')').count(),
            _ => false,
        };
        if !trim {
            return url;
        }
        url = &url[..url.len() - last.len_utf8()];
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_cross_references_plain_and_alias() {
        let refs = cross_references("See [[Foo Bar]] and [[Baz | the Baz]].");

        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].target, "Foo Bar");
        assert_eq!(refs[0].display, None);
        assert_eq!(refs[0].display_text(), "Foo Bar");
        assert_eq!(refs[0].slug(), "foo-bar");
        assert_eq!(refs[1].target, "Baz");
        assert_eq!(refs[1].display_text(), "the Baz");
        assert_eq!(refs[0].range, 4..15);
    }

    #[test]
    fn test_cross_references_do_not_span_lines() {
        assert!(cross_references("[[Foo\nBar]]").is_empty());
    }

    #[test]
    fn test_cross_references_skip_blank_target() {
        assert!(cross_references("[[ ]] [[|x]]").is_empty());
    }

    #[test]
    fn test_cross_references_blank_alias_falls_back_to_target() {
        let refs = cross_references("[[Foo|]]");

        assert_eq!(refs[0].display_text(), "Foo");
    }

    #[test]
    fn test_strip_cross_references() {
        assert_eq!(strip_cross_references("# [[Keep]] Hall"), "# Keep Hall");
        assert!(matches!(
            strip_cross_references("no refs"),
            Cow::Borrowed("no refs")
        ));
    }

    #[test]
    fn test_render_text_cross_reference() {
        let html = render_text("Go to [[Foo Bar]]!", "", &ClassMap::default(), false);

        assert_eq!(
            html,
            r#"Go to <a class="gm-link gm-wikilink" href="/pages/foo-bar">Foo Bar</a>!"#
        );
    }

    #[test]
    fn test_render_text_alias_with_base() {
        let html = render_text(
            "[[Foo|Alias <b>]]",
            "http://h:3000/",
            &ClassMap::default(),
            false,
        );

        assert_eq!(
            html,
            r#"<a class="gm-link gm-wikilink" href="http://h:3000/pages/foo">Alias &lt;b&gt;</a>"#
        );
    }

    #[test]
    fn test_render_text_inside_link() {
        let html = render_text("[[Foo|Alias]] https://x.y", "", &ClassMap::default(), true);

        assert_eq!(html, "Alias https://x.y");
    }

    #[test]
    fn test_render_text_autolinks_bare_urls() {
        let html = render_text(
            "Map at https://example.com/map.png. Done",
            "",
            &ClassMap::default(),
            false,
        );

        assert_eq!(
            html,
            r#"Map at <a class="gm-link" href="https://example.com/map.png">https://example.com/map.png</a>. Done"#
        );
    }

    #[test]
    fn test_render_text_url_in_parentheses() {
        let html = render_text(
            "(see https://w.org/a), or www.w.org.",
            "",
            &ClassMap::default(),
            false,
        );

        assert_eq!(
            html,
            r#"(see <a class="gm-link" href="https://w.org/a">https://w.org/a</a>), or www.w.org."#
        );
    }

    #[test]
    fn test_trim_url_parentheses() {
        assert_eq!(trim_url("https://w.org/A_(b)"), "https://w.org/A_(b)");
        assert_eq!(trim_url("https://w.org/a)"), "https://w.org/a");
        assert_eq!(trim_url("https://w.org/a?!"), "https://w.org/a");
    }

    #[test]
    fn test_page_url() {
        assert_eq!(page_url("http://h:3000/", "x"), "http://h:3000/pages/x");
        assert_eq!(page_url("", "x"), "/pages/x");
    }
}
