//! Vault tree: sessions, categories and pages.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Content hint attached to a page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    /// Page holds roll tables.
    Table,
    /// Page holds read-aloud quotes.
    Quote,
    /// Page holds images.
    Image,
}

impl BlockType {
    /// Wire name (`"table"`, `"quote"`, `"image"`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Quote => "quote",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root of one export.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    /// Display name.
    pub name: String,
    /// Top-level categories in document or folder order.
    pub categories: Vec<Category>,
}

impl Session {
    /// Create a session with no categories.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            categories: Vec::new(),
        }
    }
}

/// Named group of pages and nested categories.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Category {
    /// Display name.
    pub name: String,
    /// Pages in order.
    pub pages: Vec<Page>,
    /// Child categories in order.
    pub categories: Vec<Category>,
}

impl Category {
    /// Create an empty category.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pages: Vec::new(),
            categories: Vec::new(),
        }
    }

    /// Whether the category has no pages anywhere below it.
    ///
    /// A category whose children are all empty is itself empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty() && self.categories.iter().all(Category::is_empty)
    }
}

/// Link to one renderable document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    /// Display name.
    pub name: String,
    /// URL identifier, resolved by `/pages/{slug}`.
    pub slug: String,
    /// Content hints, possibly empty.
    pub block_types: BTreeSet<BlockType>,
}

impl Page {
    /// Create a page without block types.
    #[must_use]
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            block_types: BTreeSet::new(),
        }
    }

    /// Add a block type.
    #[must_use]
    pub fn with_block_type(mut self, block_type: BlockType) -> Self {
        self.block_types.insert(block_type);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_empty_is_recursive() {
        let mut category = Category::new("Root");
        assert!(category.is_empty());

        category.categories.push(Category::new("Child"));
        assert!(category.is_empty());

        category.categories[0]
            .pages
            .push(Page::new("Mage", "mage"));
        assert!(!category.is_empty());
    }

    #[test]
    fn test_block_type_serializes_lowercase() {
        let json = serde_json::to_string(&[BlockType::Table, BlockType::Image]).unwrap();

        assert_eq!(json, r#"["table","image"]"#);
    }

    #[test]
    fn test_page_block_types_are_a_set() {
        let page = Page::new("Loot", "loot")
            .with_block_type(BlockType::Table)
            .with_block_type(BlockType::Table);

        assert_eq!(page.block_types.len(), 1);
    }
}
