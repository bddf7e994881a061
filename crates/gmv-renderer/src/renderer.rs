//! Markdown to HTML renderer with class injection.

use std::fmt::Write;

use pulldown_cmark::{
    CodeBlockKind, Event, HeadingLevel, LinkType, Options, Parser, Tag, TagEnd, TextMergeStream,
};

use crate::classes::{ClassInjector, ClassMap};
use crate::links::{render_text, strip_cross_references};
use crate::state::{CodeBlockState, HeadingState, ImageState, TableState, escape_html};
use crate::urls::normalize_base_url;

/// Markdown renderer for vault documents.
///
/// Base syntax is handled by `pulldown-cmark`. On top of it the renderer:
///
/// - rewrites `[[target]]` and `[[target|Display]]` in literal text to links
///   at `{base_url}/pages/{slug}`
/// - autolinks bare `http(s)://` URLs
/// - adds the [`ClassMap`] classes to structural tags as they are emitted,
///   including tags from raw HTML in the source
///
/// The renderer holds configuration only and can be shared between threads.
///
/// # Example
///
/// ```
/// use gmv_renderer::MarkdownRenderer;
///
/// let html = MarkdownRenderer::new().render("Meet [[Vex]].");
/// assert_eq!(
///     html,
///     r#"<p class="gm-paragraph">Meet <a class="gm-link gm-wikilink" href="/pages/vex">Vex</a>.</p>"#
/// );
/// ```
#[derive(Clone, Debug, Default)]
pub struct MarkdownRenderer {
    base_url: String,
    classes: ClassMap,
}

impl MarkdownRenderer {
    /// Create a renderer with root-relative page links and default classes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL prepended to cross-reference links.
    ///
    /// A trailing `/` is stripped.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        self.base_url = normalize_base_url(&base_url).to_owned();
        self
    }

    /// Replace the class mapping.
    #[must_use]
    pub fn with_classes(mut self, classes: ClassMap) -> Self {
        self.classes = classes;
        self
    }

    /// Base URL without trailing `/`; empty for root-relative links.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Class mapping in use.
    #[must_use]
    pub fn classes(&self) -> &ClassMap {
        &self.classes
    }

    /// Parser options used for every document.
    #[must_use]
    pub fn parser_options() -> Options {
        Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_SMART_PUNCTUATION
            | Options::ENABLE_YAML_STYLE_METADATA_BLOCKS
    }

    /// Render markdown to an HTML fragment.
    #[must_use]
    pub fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, Self::parser_options());
        let mut writer = HtmlWriter::new(self);
        for event in TextMergeStream::new(parser) {
            writer.process_event(event);
        }
        writer.output
    }
}

/// Per-render state.
struct HtmlWriter<'r> {
    output: String,
    base_url: &'r str,
    injector: ClassInjector,
    code: CodeBlockState,
    table: TableState,
    image: ImageState,
    heading: HeadingState,
    pending_image: Option<(String, String)>,
    in_metadata: bool,
}

impl<'r> HtmlWriter<'r> {
    fn new(renderer: &'r MarkdownRenderer) -> Self {
        Self {
            output: String::with_capacity(4096),
            base_url: &renderer.base_url,
            injector: ClassInjector::new(renderer.classes.clone()),
            code: CodeBlockState::default(),
            table: TableState::default(),
            image: ImageState::default(),
            heading: HeadingState::default(),
            pending_image: None,
            in_metadata: false,
        }
    }

    /// Push content to output or heading buffer based on context.
    fn push_inline(&mut self, content: &str) {
        if self.heading.is_active() {
            self.heading.push_html(content);
        } else {
            self.output.push_str(content);
        }
    }

    /// Emit markup, classing its opening tags. Suppressed inside image alt text.
    fn tag(&mut self, html: &str) {
        if self.image.is_active() {
            return;
        }
        let html = self.injector.decorate(html);
        self.push_inline(&html);
    }

    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline_code(&code),
            Event::Html(html) | Event::InlineHtml(html) => self.tag(&html),
            Event::SoftBreak => self.soft_break(),
            Event::HardBreak => self.tag("<br>"),
            Event::Rule => self.tag("<hr>"),
            Event::TaskListMarker(checked) => {
                let checked = if checked { " checked" } else { "" };
                self.tag(&format!(r#"<input type="checkbox" disabled{checked}>"#));
            }
            Event::FootnoteReference(_) | Event::InlineMath(_) | Event::DisplayMath(_) => {
                // Not supported
            }
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.tag("<p>"),
            Tag::Heading { level, .. } => {
                // Opening tag is written in end_tag once the ID is known.
                self.heading.start_heading(heading_level_to_num(level));
            }
            Tag::BlockQuote(_) => self.tag("<blockquote>"),
            Tag::CodeBlock(kind) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_owned),
                    CodeBlockKind::Indented => None,
                };
                self.code.start(lang);
            }
            Tag::List(Some(1)) => self.tag("<ol>"),
            Tag::List(Some(start)) => self.tag(&format!(r#"<ol start="{start}">"#)),
            Tag::List(None) => self.tag("<ul>"),
            Tag::Item => self.tag("<li>"),
            Tag::MetadataBlock(_) => self.in_metadata = true,
            Tag::FootnoteDefinition(_) | Tag::HtmlBlock => {}
            Tag::DefinitionList => self.tag("<dl>"),
            Tag::DefinitionListTitle => self.tag("<dt>"),
            Tag::DefinitionListDefinition => self.tag("<dd>"),
            Tag::Table(alignments) => {
                self.table.start(alignments);
                self.tag("<table>");
            }
            Tag::TableHead => {
                self.table.start_head();
                self.tag("<thead><tr>");
            }
            Tag::TableRow => {
                self.table.start_row();
                self.tag("<tr>");
            }
            Tag::TableCell => {
                let align = self.table.current_alignment_style();
                let cell = if self.table.is_in_head() { "th" } else { "td" };
                self.tag(&format!("<{cell}{align}>"));
            }
            Tag::Emphasis => self.tag("<em>"),
            Tag::Strong => self.tag("<strong>"),
            Tag::Strikethrough => self.tag("<s>"),
            Tag::Link {
                link_type,
                dest_url,
                title,
                ..
            } => {
                let href = match link_type {
                    LinkType::Email => format!("mailto:{dest_url}"),
                    _ => dest_url.to_string(),
                };
                let title_attr = if title.is_empty() {
                    String::new()
                } else {
                    format!(r#" title="{}""#, escape_html(&title))
                };
                self.tag(&format!(
                    r#"<a href="{}"{title_attr}>"#,
                    escape_html(&href)
                ));
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                // Alt text is collected until the end tag.
                self.image.start();
                self.pending_image = Some((dest_url.to_string(), title.to_string()));
            }
            Tag::Superscript => self.tag("<sup>"),
            Tag::Subscript => self.tag("<sub>"),
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.tag("</p>"),
            TagEnd::Heading(_) => {
                if let Some((level, id, html)) = self.heading.complete_heading() {
                    write!(
                        self.output,
                        r#"<h{level} id="{id}">{}</h{level}>"#,
                        html.trim()
                    )
                    .unwrap();
                }
            }
            TagEnd::BlockQuote(_) => self.tag("</blockquote>"),
            TagEnd::CodeBlock => {
                let (lang, content) = self.code.end();
                self.tag("<pre>");
                match lang {
                    Some(lang) => {
                        self.tag(&format!(r#"<code class="language-{}">"#, escape_html(&lang)));
                    }
                    None => self.tag("<code>"),
                }
                self.output.push_str(&escape_html(&content));
                self.tag("</code></pre>");
            }
            TagEnd::List(ordered) => self.tag(if ordered { "</ol>" } else { "</ul>" }),
            TagEnd::Item => self.tag("</li>"),
            TagEnd::MetadataBlock(_) => self.in_metadata = false,
            TagEnd::FootnoteDefinition | TagEnd::HtmlBlock => {}
            TagEnd::Image => {
                let alt = self.image.end();
                if let Some((src, title)) = self.pending_image.take() {
                    let title_attr = if title.is_empty() {
                        String::new()
                    } else {
                        format!(r#" title="{}""#, escape_html(&title))
                    };
                    self.push_inline(&format!(
                        r#"<img src="{}"{title_attr} alt="{}">"#,
                        escape_html(&src),
                        escape_html(&alt)
                    ));
                }
            }
            TagEnd::DefinitionList => self.tag("</dl>"),
            TagEnd::DefinitionListTitle => self.tag("</dt>"),
            TagEnd::DefinitionListDefinition => self.tag("</dd>"),
            TagEnd::Table => self.tag("</tbody></table>"),
            TagEnd::TableHead => {
                self.tag("</tr></thead><tbody>");
                self.table.end_head();
            }
            TagEnd::TableRow => self.tag("</tr>"),
            TagEnd::TableCell => {
                self.tag(if self.table.is_in_head() {
                    "</th>"
                } else {
                    "</td>"
                });
                self.table.next_cell();
            }
            TagEnd::Emphasis => self.tag("</em>"),
            TagEnd::Strong => self.tag("</strong>"),
            TagEnd::Strikethrough => self.tag("</s>"),
            TagEnd::Link => self.tag("</a>"),
            TagEnd::Superscript => self.tag("</sup>"),
            TagEnd::Subscript => self.tag("</sub>"),
        }
    }

    fn text(&mut self, text: &str) {
        if self.in_metadata {
            return;
        }
        if self.code.is_active() {
            self.code.push_str(text);
        } else if self.image.is_active() {
            self.image.push_str(&strip_cross_references(text));
        } else {
            let html = render_text(
                text,
                self.base_url,
                self.injector.classes(),
                self.injector.in_anchor(),
            );
            if self.heading.is_active() {
                self.heading.push_text(&strip_cross_references(text));
            }
            self.push_inline(&html);
        }
    }

    fn inline_code(&mut self, code: &str) {
        if self.image.is_active() {
            self.image.push_str(code);
            return;
        }
        if self.heading.is_active() {
            self.heading.push_text(code);
        }
        self.tag("<code>");
        self.push_inline(&escape_html(code));
        self.tag("</code>");
    }

    fn soft_break(&mut self) {
        if self.code.is_active() {
            self.code.push_str("\n");
        } else if self.image.is_active() {
            self.image.push_str(" ");
        } else {
            self.push_inline("\n");
        }
    }
}

/// Convert heading level enum to number (1-6).
fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
