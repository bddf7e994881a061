//! JSON export of a session.
//!
//! Wire format:
//!
//! ```json
//! { "categories": [ { "name": "...", "pages": [ { "name": "...", "url": "...", "blockTypes": ["table"] } ], "categories": [ ... ] } ] }
//! ```
//!
//! `pages`, `categories` and `blockTypes` are omitted when empty. Categories
//! without any page below them are dropped from the tree.

use gmv_renderer::page_url;
use serde::{Deserialize, Serialize};

use crate::model::{BlockType, Category, Page, Session};

/// Exported session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultExport {
    /// Non-empty top-level categories.
    pub categories: Vec<CategoryExport>,
}

/// Exported category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryExport {
    /// Display name.
    pub name: String,
    /// Pages, omitted when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pages: Vec<PageExport>,
    /// Non-empty child categories, omitted when none.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<CategoryExport>,
}

/// Exported page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageExport {
    /// Display name.
    pub name: String,
    /// `{base_url}/pages/{slug}`.
    pub url: String,
    /// Content hints, omitted when empty.
    #[serde(
        rename = "blockTypes",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub block_types: Vec<BlockType>,
}

/// Converts sessions to the wire format.
///
/// Page URLs are computed at export time, so the base URL can change (e.g.
/// when a tunnel opens) without rebuilding the tree.
#[derive(Clone, Debug, Default)]
pub struct JsonExporter {
    base_url: String,
}

impl JsonExporter {
    /// Create an exporter for the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut exporter = Self::default();
        exporter.set_base_url(base_url);
        exporter
    }

    /// Change the base URL. A trailing `/` is stripped.
    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        let base_url: String = base_url.into();
        self.base_url = base_url.trim_end_matches('/').to_owned();
    }

    /// Base URL without trailing `/`.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Export a session, dropping empty categories.
    #[must_use]
    pub fn build_json(&self, session: &Session) -> VaultExport {
        VaultExport {
            categories: self.export_children(&session.categories),
        }
    }

    /// Export one category.
    ///
    /// The category itself is exported even when empty, as `{ "name": ... }`;
    /// its empty descendants are dropped.
    #[must_use]
    pub fn export_category(&self, category: &Category) -> CategoryExport {
        CategoryExport {
            name: category.name.clone(),
            pages: category.pages.iter().map(|p| self.export_page(p)).collect(),
            categories: self.export_children(&category.categories),
        }
    }

    /// Export one page.
    #[must_use]
    pub fn export_page(&self, page: &Page) -> PageExport {
        PageExport {
            name: page.name.clone(),
            url: page_url(&self.base_url, &page.slug),
            block_types: page.block_types.iter().copied().collect(),
        }
    }

    /// Export a session as a JSON value.
    pub fn to_value(&self, session: &Session) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self.build_json(session))
    }

    fn export_children(&self, categories: &[Category]) -> Vec<CategoryExport> {
        categories
            .iter()
            .filter(|c| !c.is_empty())
            .map(|c| self.export_category(c))
            .collect()
    }
}
