//! Vault tree extraction and JSON export.
//!
//! A [`TreeParser`] reads the vault around an entry document into a
//! [`Session`] of [`Category`] and [`Page`] values. [`JsonExporter`] turns the
//! session into the compact wire format served at `/gm-vault`.
//!
//! # Example
//!
//! ```
//! use gmv_tree::{HeadingMode, HeadingParser, JsonExporter};
//!
//! let session = HeadingParser::new(HeadingMode::Structured)
//!     .parse_text("Prep", "# Session 1\n## Tables\n- [[Random Loot]]\n");
//!
//! let export = JsonExporter::new("http://127.0.0.1:3000").build_json(&session);
//! let loot = &export.categories[0].categories[0].pages[0];
//! assert_eq!(loot.url, "http://127.0.0.1:3000/pages/random-loot");
//! ```

mod exporter;
mod model;
mod parser;
mod scan;

pub use exporter::{CategoryExport, JsonExporter, PageExport, VaultExport};
pub use model::{BlockType, Category, Page, Session};
pub use parser::{
    DEFAULT_IGNORE_HEADINGS, FolderParser, HeadingMode, HeadingParser, ParseError, ParseStrategy,
    TreeParser, UnknownStrategy,
};

/// First `#` heading of a document, cross-references reduced to display text.
#[must_use]
pub fn first_heading(text: &str) -> Option<String> {
    scan::first_heading(text)
}
