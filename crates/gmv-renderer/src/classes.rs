//! Presentational class injection.
//!
//! [`ClassMap`] names the class each structural tag receives. The renderer
//! asks a [`ClassInjector`] for the class while it emits tags, and runs the
//! same injector over raw HTML that passes through from the source.
//! [`normalize_classes`] applies the mapping to already-serialized HTML.
//!
//! Injection is idempotent: a tag whose `class` attribute already contains the
//! target class is left untouched.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// Matches a quoted `class` attribute inside an opening tag.
static CLASS_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\sclass\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap());

/// Class names injected onto structural tags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassMap {
    /// `<p>`.
    pub paragraph: String,
    /// `<ul>`.
    pub bullet_list: String,
    /// `<ol>`.
    pub ordered_list: String,
    /// `<li>` nested in a classed list container.
    pub list_item: String,
    /// `<pre>` wrapping a code block.
    pub code_block: String,
    /// `<code>` outside of a `<pre>`.
    pub inline_code: String,
    /// `<a>`.
    pub link: String,
    /// `<strong>` and `<b>`.
    pub bold: String,
    /// `<em>` and `<i>`.
    pub italic: String,
    /// `<u>`.
    pub underline: String,
    /// `<s>`, `<del>` and `<strike>`.
    pub strikethrough: String,
    /// `<blockquote>`.
    pub blockquote: String,
    /// `<table>`.
    pub table: String,
    /// `<hr>`.
    pub rule: String,
}

impl Default for ClassMap {
    fn default() -> Self {
        Self {
            paragraph: "gm-paragraph".to_owned(),
            bullet_list: "gm-list-bullet".to_owned(),
            ordered_list: "gm-list-ordered".to_owned(),
            list_item: "gm-list-item".to_owned(),
            code_block: "gm-code-block".to_owned(),
            inline_code: "gm-code-inline".to_owned(),
            link: "gm-link".to_owned(),
            bold: "gm-bold".to_owned(),
            italic: "gm-italic".to_owned(),
            underline: "gm-underline".to_owned(),
            strikethrough: "gm-strike".to_owned(),
            blockquote: "gm-blockquote".to_owned(),
            table: "gm-table".to_owned(),
            rule: "gm-rule".to_owned(),
        }
    }
}

/// Tracks list and `<pre>` nesting so context-dependent classes resolve correctly.
#[derive(Clone, Debug)]
pub(crate) struct ClassInjector {
    classes: ClassMap,
    /// One entry per open list container: whether it carries its list class.
    lists: Vec<bool>,
    pre_depth: usize,
    anchor_depth: usize,
}

impl ClassInjector {
    pub(crate) fn new(classes: ClassMap) -> Self {
        Self {
            classes,
            lists: Vec::new(),
            pre_depth: 0,
            anchor_depth: 0,
        }
    }

    pub(crate) fn classes(&self) -> &ClassMap {
        &self.classes
    }

    /// Whether an `<a>` emitted so far, raw or generated, is still open.
    pub(crate) fn in_anchor(&self) -> bool {
        self.anchor_depth > 0
    }

    /// Class for an opening tag in the current context.
    ///
    /// Does not update nesting; call [`enter`](Self::enter) once the final tag is known.
    pub(crate) fn class_for(&self, name: &str) -> Option<&str> {
        let c = &self.classes;
        let class = match name {
            "p" => &c.paragraph,
            "ul" => &c.bullet_list,
            "ol" => &c.ordered_list,
            "li" if self.lists.last() == Some(&true) => &c.list_item,
            "pre" => &c.code_block,
            "code" if self.pre_depth == 0 => &c.inline_code,
            "a" => &c.link,
            "strong" | "b" => &c.bold,
            "em" | "i" => &c.italic,
            "u" => &c.underline,
            "s" | "del" | "strike" => &c.strikethrough,
            "blockquote" => &c.blockquote,
            "table" => &c.table,
            "hr" => &c.rule,
            _ => return None,
        };
        Some(class.as_str())
    }

    /// Record an opening tag. `classed` reports whether it carries its class.
    pub(crate) fn enter(&mut self, name: &str, classed: bool) {
        match name {
            "ul" | "ol" => self.lists.push(classed),
            "pre" => self.pre_depth += 1,
            "a" => self.anchor_depth += 1,
            _ => {}
        }
    }

    /// Record a closing tag.
    pub(crate) fn leave(&mut self, name: &str) {
        match name {
            "ul" | "ol" => {
                self.lists.pop();
            }
            "pre" => self.pre_depth = self.pre_depth.saturating_sub(1),
            "a" => self.anchor_depth = self.anchor_depth.saturating_sub(1),
            _ => {}
        }
    }

    /// Decorate every opening tag in an HTML fragment.
    pub(crate) fn decorate(&mut self, html: &str) -> String {
        let mut out = String::with_capacity(html.len() + 32);
        let mut rest = html;

        while let Some(lt) = rest.find('<') {
            out.push_str(&rest[..lt]);
            rest = &rest[lt..];

            // Comments are copied verbatim, including any tags inside them.
            if rest.starts_with("<!--") {
                let end = rest.find("-->").map_or(rest.len(), |pos| pos + 3);
                out.push_str(&rest[..end]);
                rest = &rest[end..];
                continue;
            }

            let Some(tag_len) = tag_length(rest) else {
                out.push('<');
                rest = &rest[1..];
                continue;
            };
            let tag = &rest[..tag_len];
            rest = &rest[tag_len..];

            match parse_tag(tag) {
                Some((name, true)) => {
                    self.leave(&name);
                    out.push_str(tag);
                }
                Some((name, false)) => {
                    let decorated = match self.class_for(&name) {
                        Some(class) => add_class(tag, class),
                        None => Cow::Borrowed(tag),
                    };
                    let classed = self
                        .class_for(&name)
                        .is_some_and(|class| has_class(&decorated, class));
                    self.enter(&name, classed);
                    out.push_str(&decorated);
                }
                None => out.push_str(tag),
            }
        }

        out.push_str(rest);
        out
    }
}

/// Apply presentational classes to serialized HTML.
///
/// Walks every opening tag once, tracking list containers so that `<li>` is
/// classed only inside a classed `<ul>`/`<ol>`, and `<pre>` so that `<code>`
/// inside a code block is not treated as inline code.
///
/// Running the pass twice yields byte-identical output to running it once.
///
/// # Examples
///
/// ```
/// use gmv_renderer::{ClassMap, normalize_classes};
///
/// let html = normalize_classes("<p>Hi <b>there</b></p>", &ClassMap::default());
/// assert_eq!(html, r#"<p class="gm-paragraph">Hi <b class="gm-bold">there</b></p>"#);
/// ```
#[must_use]
pub fn normalize_classes(html: &str, classes: &ClassMap) -> String {
    ClassInjector::new(classes.clone()).decorate(html)
}

/// Length of the tag starting at `s[0] == '<'`, honouring quoted attribute values.
///
/// Returns `None` if `s` does not start a tag (e.g. a stray `<` in text).
fn tag_length(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    match bytes.get(1) {
        Some(b'/' | b'!' | b'?') => {}
        Some(b) if b.is_ascii_alphabetic() => {}
        _ => return None,
    }

    let mut quote: Option<u8> = None;
    for (i, &b) in bytes.iter().enumerate().skip(1) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => return Some(i + 1),
            None => {}
        }
    }
    None
}

/// Parse a tag into its lower-cased name and whether it is a closing tag.
///
/// Returns `None` for declarations and processing instructions.
fn parse_tag(tag: &str) -> Option<(String, bool)> {
    let inner = tag.strip_prefix('<')?;
    let (inner, closing) = match inner.strip_prefix('/') {
        Some(rest) => (rest, true),
        None => (inner, false),
    };
    let name: String = inner
        .chars()
        .take_while(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if name.is_empty() {
        None
    } else {
        Some((name, closing))
    }
}

/// Whether the tag's class attribute already contains `class` (substring match).
fn has_class(tag: &str, class: &str) -> bool {
    CLASS_ATTR_RE.captures(tag).is_some_and(|caps| {
        caps.get(1)
            .or_else(|| caps.get(2))
            .is_some_and(|value| value.as_str().contains(class))
    })
}

/// Add `class` to an opening tag, appending to an existing class attribute.
pub(crate) fn add_class<'a>(tag: &'a str, class: &str) -> Cow<'a, str> {
    if let Some(caps) = CLASS_ATTR_RE.captures(tag) {
        let Some(value) = caps.get(1).or_else(|| caps.get(2)) else {
            return Cow::Borrowed(tag);
        };
        if value.as_str().contains(class) {
            return Cow::Borrowed(tag);
        }
        let separator = if value.as_str().trim().is_empty() { "" } else { " " };
        return Cow::Owned(format!(
            "{}{separator}{class}{}",
            &tag[..value.end()],
            &tag[value.end()..]
        ));
    }

    let insert_at = if tag.ends_with("/>") {
        tag.len() - 2
    } else {
        tag.len() - 1
    };
    let head = tag[..insert_at].trim_end();
    let tail = &tag[insert_at..];
    let spacer = if tail.starts_with('/') { " " } else { "" };
    Cow::Owned(format!(r#"{head} class="{class}"{spacer}{tail}"#))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn normalize(html: &str) -> String {
        normalize_classes(html, &ClassMap::default())
    }

    #[test]
    fn test_injector_tracks_open_anchors() {
        let mut injector = ClassInjector::new(ClassMap::default());

        injector.decorate(r#"<A href="x"><b>"#);
        assert!(injector.in_anchor());
        injector.decorate("</b></a>");
        assert!(!injector.in_anchor());
    }

    #[test]
    fn test_add_class_without_attribute() {
        assert_eq!(add_class("<p>", "x"), r#"<p class="x">"#);
        assert_eq!(
            add_class(r#"<a href="/y">"#, "x"),
            r#"<a href="/y" class="x">"#
        );
    }

    #[test]
    fn test_add_class_self_closing() {
        assert_eq!(add_class("<hr/>", "x"), r#"<hr class="x" />"#);
        assert_eq!(add_class("<hr />", "x"), r#"<hr class="x" />"#);
    }

    #[test]
    fn test_add_class_appends_to_existing() {
        assert_eq!(
            add_class(r#"<b class="loud">"#, "x"),
            r#"<b class="loud x">"#
        );
        assert_eq!(add_class("<b class=''>", "x"), "<b class='x'>");
    }

    #[test]
    fn test_add_class_keeps_existing_match() {
        assert_eq!(
            add_class(r#"<b class="gm-bold">"#, "gm-bold"),
            r#"<b class="gm-bold">"#
        );
    }

    #[test]
    fn test_normalize_inline_formatting() {
        let html = normalize("<p><strong>a</strong><em>b</em><i>c</i><u>d</u><del>e</del><strike>f</strike><s>g</s></p>");

        assert_eq!(
            html,
            concat!(
                r#"<p class="gm-paragraph">"#,
                r#"<strong class="gm-bold">a</strong>"#,
                r#"<em class="gm-italic">b</em>"#,
                r#"<i class="gm-italic">c</i>"#,
                r#"<u class="gm-underline">d</u>"#,
                r#"<del class="gm-strike">e</del>"#,
                r#"<strike class="gm-strike">f</strike>"#,
                r#"<s class="gm-strike">g</s>"#,
                "</p>"
            )
        );
    }

    #[test]
    fn test_normalize_code_block_vs_inline() {
        let html = normalize("<pre><code>x</code></pre><p><code>y</code></p>");

        assert_eq!(
            html,
            r#"<pre class="gm-code-block"><code>x</code></pre><p class="gm-paragraph"><code class="gm-code-inline">y</code></p>"#
        );
    }

    #[test]
    fn test_normalize_list_items_scoped_to_lists() {
        let html = normalize("<ul><li>a<ol><li>b</li></ol></li></ul><li>stray</li>");

        assert_eq!(
            html,
            concat!(
                r#"<ul class="gm-list-bullet"><li class="gm-list-item">a"#,
                r#"<ol class="gm-list-ordered"><li class="gm-list-item">b</li></ol>"#,
                "</li></ul><li>stray</li>"
            )
        );
    }

    #[test]
    fn test_normalize_block_elements() {
        let html = normalize("<blockquote><p>q</p></blockquote><table></table><hr>");

        assert_eq!(
            html,
            r#"<blockquote class="gm-blockquote"><p class="gm-paragraph">q</p></blockquote><table class="gm-table"></table><hr class="gm-rule">"#
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let source = concat!(
            r#"<p>Text <a href="/x">link</a> <b class="loud">bold</b></p>"#,
            "<ul><li>one</li><li>two<ul><li>nested</li></ul></li></ul>",
            "<pre><code class=\"language-rust\">fn main() {}</code></pre>",
            "<!-- <p>comment</p> --><hr/>"
        );

        let once = normalize(source);
        let twice = normalize(&once);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_normalize_leaves_comments_and_stray_lt() {
        let html = normalize("<!-- <p> --> 1 < 2");

        assert_eq!(html, "<!-- <p> --> 1 < 2");
    }

    #[test]
    fn test_normalize_attribute_with_gt() {
        let html = normalize(r#"<a title="a > b" href="/x">x</a>"#);

        assert_eq!(html, r#"<a title="a > b" href="/x" class="gm-link">x</a>"#);
    }

    #[test]
    fn test_normalize_unknown_tags_untouched() {
        let html = normalize(r#"<div><span>x</span><h2 id="a">A</h2></div>"#);

        assert_eq!(html, r#"<div><span>x</span><h2 id="a">A</h2></div>"#);
    }

    #[test]
    fn test_custom_class_map() {
        let classes = ClassMap {
            paragraph: "para".to_owned(),
            ..ClassMap::default()
        };

        assert_eq!(normalize_classes("<p>x</p>", &classes), r#"<p class="para">x</p>"#);
    }
}
