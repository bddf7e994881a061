//! Standalone HTML documents: rendered pages and image galleries.

use std::fmt::Write;

use crate::renderer::MarkdownRenderer;
use crate::state::escape_html;
use crate::urls::{absolutize_urls, is_absolute_url, normalize_base_url};

/// Cells per gallery row.
const GALLERY_COLUMNS: usize = 3;

/// An image shown in a gallery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GalleryImage {
    /// Caption.
    pub name: String,
    /// Absolute URL or a path relative to the base URL.
    pub path: String,
}

impl GalleryImage {
    /// Create a gallery image.
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

impl MarkdownRenderer {
    /// Render markdown into a complete HTML document.
    ///
    /// With a base URL, root-relative links and image sources are made absolute.
    #[must_use]
    pub fn render_page(&self, markdown: &str, title: &str) -> String {
        let mut body = self.render(markdown);
        if !self.base_url().is_empty() {
            body = absolutize_urls(&body, self.base_url());
        }
        document_shell(title, &body)
    }

    /// Render images into a complete HTML document, three per row.
    ///
    /// Sources with a scheme (or protocol-relative) are used verbatim; others
    /// are joined to the base URL. The last row is padded with empty cells.
    #[must_use]
    pub fn render_image_gallery(&self, images: &[GalleryImage], title: &str) -> String {
        let base = normalize_base_url(self.base_url());
        let mut body = String::from(r#"<div class="gm-gallery">"#);

        for row in images.chunks(GALLERY_COLUMNS) {
            body.push_str(r#"<div class="gm-gallery-row">"#);
            for image in row {
                let src = if is_absolute_url(&image.path) {
                    image.path.clone()
                } else {
                    format!("{base}/{}", image.path.trim_start_matches('/'))
                };
                let name = escape_html(&image.name);
                write!(
                    body,
                    r#"<div class="gm-gallery-cell"><img src="{}" alt="{name}"><div class="gm-gallery-caption">{name}</div></div>"#,
                    escape_html(&src)
                )
                .unwrap();
            }
            for _ in row.len()..GALLERY_COLUMNS {
                body.push_str(r#"<div class="gm-gallery-cell gm-gallery-empty"></div>"#);
            }
            body.push_str("</div>");
        }

        body.push_str("</div>");
        document_shell(title, &body)
    }
}

/// Render a page with default classes.
///
/// Shorthand for [`MarkdownRenderer::render_page`] with an optional base URL.
#[must_use]
pub fn render_page(markdown: &str, title: &str, base_url: Option<&str>) -> String {
    renderer_for(base_url).render_page(markdown, title)
}

/// Render an image gallery with an optional base URL.
///
/// Shorthand for [`MarkdownRenderer::render_image_gallery`].
#[must_use]
pub fn render_image_gallery(images: &[GalleryImage], title: &str, base_url: Option<&str>) -> String {
    renderer_for(base_url).render_image_gallery(images, title)
}

fn renderer_for(base_url: Option<&str>) -> MarkdownRenderer {
    match base_url {
        Some(base) => MarkdownRenderer::new().with_base_url(base),
        None => MarkdownRenderer::new(),
    }
}

fn document_shell(title: &str, body: &str) -> String {
    format!(
        concat!(
            "<!DOCTYPE html>\n",
            "<html>\n",
            "<head>\n",
            "<meta charset=\"utf-8\">\n",
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
            "<title>{}</title>\n",
            "</head>\n",
            "<body>\n",
            "<div class=\"gm-content\">{}</div>\n",
            "</body>\n",
            "</html>\n"
        ),
        escape_html(title),
        body
    )
}
