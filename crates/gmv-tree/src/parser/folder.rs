//! Folder-hierarchy parser.

use gmv_renderer::slugify;
use gmv_storage::{DocumentRef, Entry, Storage};

use super::{ParseError, TreeParser, document_title};
use crate::model::{Category, Page, Session};
use crate::scan::compare_names;

/// Builds a session from the folder containing the entry document.
///
/// The folder becomes the single root category, named after the entry
/// document's first heading. Every other markdown file becomes a page and
/// every sub-folder a nested category. At each level pages come first, then
/// categories, each sorted by name.
#[derive(Clone, Copy, Debug, Default)]
pub struct FolderParser;

impl TreeParser for FolderParser {
    fn parse(&self, storage: &dyn Storage, entry: &DocumentRef) -> Result<Session, ParseError> {
        let root_path = entry.parent();
        let entries = storage.list(root_path).map_err(|source| ParseError::ListRoot {
            path: root_path.to_owned(),
            source,
        })?;

        let name = document_title(storage, entry);
        let mut root = Category::new(name.clone());
        fill_category(storage, entry, entries, &mut root);

        tracing::debug!(entry = %entry, "Parsed folder tree");
        Ok(Session {
            name,
            categories: vec![root],
        })
    }
}

fn fill_category(
    storage: &dyn Storage,
    entry: &DocumentRef,
    entries: Vec<Entry>,
    category: &mut Category,
) {
    let mut folders = Vec::new();
    let mut files = Vec::new();
    for child in entries {
        match child {
            Entry::Folder { path, name } => folders.push((path, name)),
            Entry::File(doc) if doc.is_markdown() && doc != *entry => files.push(doc),
            Entry::File(_) => {}
        }
    }
    files.sort_by(|a, b| compare_names(a.name(), b.name()));
    folders.sort_by(|a, b| compare_names(&a.1, &b.1));

    for doc in files {
        category
            .pages
            .push(Page::new(document_title(storage, &doc), slugify(doc.stem())));
    }

    for (path, name) in folders {
        let mut child = Category::new(name);
        match storage.list(&path) {
            Ok(entries) => fill_category(storage, entry, entries, &mut child),
            Err(err) => {
                tracing::warn!(folder = %path, error = %err, "Failed to list folder, leaving it empty");
            }
        }
        category.categories.push(child);
    }
}

#[cfg(test)]
mod tests {
    use gmv_storage::MockStorage;
    use pretty_assertions::assert_eq;

    use super::*;

    fn page_names(category: &Category) -> Vec<&str> {
        category.pages.iter().map(|p| p.name.as_str()).collect()
    }

    fn category_names(category: &Category) -> Vec<&str> {
        category.categories.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_entry_document_names_root_and_is_excluded() {
        let storage = MockStorage::new()
            .with_file("Campaign/Index.md", "# The [[Sunken|Sunken]] Campaign\n")
            .with_file("Campaign/Tavern.md", "# The Tavern");

        let session = FolderParser
            .parse(&storage, &DocumentRef::new("Campaign/Index.md"))
            .unwrap();

        assert_eq!(session.name, "The Sunken Campaign");
        assert_eq!(session.categories.len(), 1);
        let root = &session.categories[0];
        assert_eq!(root.name, "The Sunken Campaign");
        assert_eq!(page_names(root), vec!["The Tavern"]);
        assert_eq!(root.pages[0].slug, "tavern");
        assert!(root.pages[0].block_types.is_empty());
    }

    #[test]
    fn test_files_then_folders_each_sorted() {
        let storage = MockStorage::new()
            .with_file("Index.md", "no heading")
            .with_file("zeta.md", "")
            .with_file("Alpha.md", "")
            .with_file("beta.MD", "")
            .with_file("notes.txt", "")
            .with_file("Places/Town.md", "")
            .with_file("npcs/Mage.md", "")
            .with_folder("Empty");

        let session = FolderParser
            .parse(&storage, &DocumentRef::new("Index.md"))
            .unwrap();

        let root = &session.categories[0];
        assert_eq!(root.name, "Index");
        assert_eq!(page_names(root), vec!["Alpha", "beta", "zeta"]);
        assert_eq!(category_names(root), vec!["Empty", "npcs", "Places"]);
        assert!(root.categories[0].is_empty());
        assert_eq!(page_names(&root.categories[2]), vec!["Town"]);
    }

    #[test]
    fn test_accented_names_sort_with_base_letter() {
        let storage = MockStorage::new()
            .with_file("Index.md", "")
            .with_file("Zebra.md", "")
            .with_file("Éclair.md", "")
            .with_file("apple.md", "")
            .with_file("Ödland/Camp.md", "")
            .with_file("Ruins/Gate.md", "");

        let session = FolderParser
            .parse(&storage, &DocumentRef::new("Index.md"))
            .unwrap();

        let root = &session.categories[0];
        assert_eq!(page_names(root), vec!["apple", "Éclair", "Zebra"]);
        assert_eq!(category_names(root), vec!["Ödland", "Ruins"]);
    }

    #[test]
    fn test_unreadable_file_falls_back_to_stem() {
        let storage = MockStorage::new()
            .with_file("Index.md", "# Root")
            .with_unreadable("Old Mage.md");

        let session = FolderParser
            .parse(&storage, &DocumentRef::new("Index.md"))
            .unwrap();

        let page = &session.categories[0].pages[0];
        assert_eq!(page.name, "Old Mage");
        assert_eq!(page.slug, "old-mage");
    }

    #[test]
    fn test_unreadable_entry_falls_back_to_stem() {
        let storage = MockStorage::new().with_unreadable("Vault/Start Here.md");

        let session = FolderParser
            .parse(&storage, &DocumentRef::new("Vault/Start Here.md"))
            .unwrap();

        assert_eq!(session.name, "Start Here");
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let storage = MockStorage::new();

        let err = FolderParser
            .parse(&storage, &DocumentRef::new("Gone/Index.md"))
            .unwrap_err();

        assert!(matches!(err, ParseError::ListRoot { ref path, .. } if path == "Gone"));
    }

    #[test]
    fn test_nested_folders_recurse() {
        let storage = MockStorage::new()
            .with_file("Index.md", "# Root")
            .with_file("Act 1/Scene/Ambush.md", "# Ambush!");

        let session = FolderParser
            .parse(&storage, &DocumentRef::new("Index.md"))
            .unwrap();

        let act = &session.categories[0].categories[0];
        assert_eq!(act.name, "Act 1");
        assert!(act.pages.is_empty());
        assert_eq!(act.categories[0].name, "Scene");
        assert_eq!(act.categories[0].pages[0].name, "Ambush!");
        assert_eq!(act.categories[0].pages[0].slug, "ambush");
    }
}
