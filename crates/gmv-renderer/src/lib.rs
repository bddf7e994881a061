//! Markdown rendering for vault pages.
//!
//! Converts vault documents to HTML fragments and standalone pages:
//!
//! - [`MarkdownRenderer`] renders markdown with `pulldown-cmark`, rewriting
//!   `[[target]]` cross-references to `/pages/{slug}` links and adding
//!   presentational classes from a [`ClassMap`] while tags are emitted
//! - [`normalize_classes`] applies the same classes to existing HTML
//! - [`absolutize_urls`] prefixes root-relative `href`/`src` values with a base URL
//! - [`render_page`] and [`render_image_gallery`] wrap content in an HTML document
//!
//! # Example
//!
//! ```
//! use gmv_renderer::{MarkdownRenderer, slugify};
//!
//! assert_eq!(slugify("Old Mage!"), "old-mage");
//!
//! let html = MarkdownRenderer::new()
//!     .with_base_url("http://127.0.0.1:3000/")
//!     .render_page("Ask [[Old Mage|the mage]].", "Session 1");
//! assert!(html.contains(r#"href="http://127.0.0.1:3000/pages/old-mage""#));
//! ```

mod classes;
mod links;
mod page;
mod renderer;
mod slug;
mod state;
mod urls;

pub use classes::{ClassMap, normalize_classes};
pub use links::{
    CROSS_REFERENCE_CLASS, CrossReference, cross_references, page_url, strip_cross_references,
};
pub use page::{GalleryImage, render_image_gallery, render_page};
pub use renderer::MarkdownRenderer;
pub use slug::slugify;
pub use state::escape_html;
pub use urls::{absolutize_urls, is_absolute_url, normalize_base_url};
