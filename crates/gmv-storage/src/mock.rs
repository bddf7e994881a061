//! Mock storage implementation for testing.
//!
//! Provides [`MockStorage`] for unit testing without filesystem access.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use crate::document::{DocumentRef, Entry, join};
use crate::storage::{Storage, StorageError, StorageErrorKind};

/// Backend identifier for error messages.
const BACKEND: &str = "Mock";

/// Mock storage for testing.
///
/// Stores documents in memory. Folders are implied by document paths; empty
/// folders can be added explicitly. Use the builder methods to configure the
/// mock with test data.
///
/// # Example
///
/// ```ignore
/// use gmv_storage::{DocumentRef, MockStorage, Storage};
///
/// let storage = MockStorage::new()
///     .with_file("Campaign/Index.md", "# Campaign")
///     .with_unreadable("Campaign/Broken.md");
///
/// let text = storage.read(&DocumentRef::new("Campaign/Index.md")).unwrap();
/// ```
#[derive(Debug, Default)]
pub struct MockStorage {
    files: RwLock<BTreeMap<String, Option<String>>>,
    folders: RwLock<BTreeSet<String>>,
}

impl MockStorage {
    /// Create a new empty mock storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document with content.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_file(self, path: impl Into<String>, content: impl Into<String>) -> Self {
        let doc = DocumentRef::new(path);
        self.files
            .write()
            .unwrap()
            .insert(doc.path().to_owned(), Some(content.into()));
        self
    }

    /// Add a document that is listed but fails to read.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_unreadable(self, path: impl Into<String>) -> Self {
        let doc = DocumentRef::new(path);
        self.files
            .write()
            .unwrap()
            .insert(doc.path().to_owned(), None);
        self
    }

    /// Add an (possibly empty) folder.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_folder(self, path: impl Into<String>) -> Self {
        let path: String = path.into();
        self.folders
            .write()
            .unwrap()
            .insert(path.trim_matches('/').to_owned());
        self
    }

    /// Replace the content of a document, creating it if needed.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn set_content(&self, path: &str, content: impl Into<String>) {
        let doc = DocumentRef::new(path);
        self.files
            .write()
            .unwrap()
            .insert(doc.path().to_owned(), Some(content.into()));
    }

    /// Whether `folder` is the root, an explicit folder or an ancestor of a known path.
    fn folder_known(&self, folder: &str) -> bool {
        if folder.is_empty() {
            return true;
        }
        let prefix = format!("{folder}/");
        self.folders
            .read()
            .unwrap()
            .iter()
            .any(|f| f == folder || f.starts_with(&prefix))
            || self
                .files
                .read()
                .unwrap()
                .keys()
                .any(|p| p.starts_with(&prefix))
    }
}

impl Storage for MockStorage {
    fn list(&self, folder: &str) -> Result<Vec<Entry>, StorageError> {
        let folder = folder.trim_matches('/');
        if self.files.read().unwrap().contains_key(folder) {
            return Err(StorageError::new(StorageErrorKind::NotAFolder)
                .with_path(folder)
                .with_backend(BACKEND));
        }
        if !self.folder_known(folder) {
            return Err(StorageError::not_found(folder).with_backend(BACKEND));
        }

        let prefix = if folder.is_empty() {
            String::new()
        } else {
            format!("{folder}/")
        };

        let mut children: BTreeMap<String, Entry> = BTreeMap::new();
        let folders = self.folders.read().unwrap();
        let files = self.files.read().unwrap();
        let paths = folders
            .iter()
            .map(|p| (p, true))
            .chain(files.keys().map(|p| (p, false)));

        for (path, is_folder) in paths {
            let Some(rest) = path.strip_prefix(&prefix) else {
                continue;
            };
            if rest.is_empty() {
                continue;
            }
            let (name, nested) = match rest.split_once('/') {
                Some((name, _)) => (name, true),
                None => (rest, false),
            };
            if name.starts_with('.') {
                continue;
            }
            let entry = if nested || is_folder {
                Entry::folder(join(folder, name))
            } else {
                Entry::File(DocumentRef::new(path.clone()))
            };
            children.entry(name.to_owned()).or_insert(entry);
        }

        Ok(children.into_values().collect())
    }

    fn read(&self, doc: &DocumentRef) -> Result<String, StorageError> {
        match self.files.read().unwrap().get(doc.path()) {
            Some(Some(content)) => Ok(content.clone()),
            Some(None) => Err(StorageError::new(StorageErrorKind::PermissionDenied)
                .with_path(doc.path())
                .with_backend(BACKEND)),
            None => Err(StorageError::not_found(doc.path()).with_backend(BACKEND)),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn storage() -> MockStorage {
        MockStorage::new()
            .with_file("Campaign/Index.md", "# Campaign")
            .with_file("Campaign/NPCs/Mage.md", "# Mage")
            .with_unreadable("Campaign/Broken.md")
            .with_folder("Campaign/Empty")
            .with_file("Other.md", "other")
    }

    #[test]
    fn test_list_root() {
        let entries = storage().list("").unwrap();

        assert_eq!(
            entries,
            vec![
                Entry::folder("Campaign"),
                Entry::File(DocumentRef::new("Other.md")),
            ]
        );
    }

    #[test]
    fn test_list_nested_includes_empty_folder() {
        let entries = storage().list("Campaign").unwrap();

        assert_eq!(
            entries,
            vec![
                Entry::File(DocumentRef::new("Campaign/Broken.md")),
                Entry::folder("Campaign/Empty"),
                Entry::File(DocumentRef::new("Campaign/Index.md")),
                Entry::folder("Campaign/NPCs"),
            ]
        );
    }

    #[test]
    fn test_list_unknown_folder() {
        let err = storage().list("Nope").unwrap_err();

        assert_eq!(err.kind(), &StorageErrorKind::NotFound);
    }

    #[test]
    fn test_list_file_is_not_a_folder() {
        let err = storage().list("Other.md").unwrap_err();

        assert_eq!(err.kind(), &StorageErrorKind::NotAFolder);
    }

    #[test]
    fn test_read_unreadable() {
        let err = storage()
            .read(&DocumentRef::new("Campaign/Broken.md"))
            .unwrap_err();

        assert_eq!(err.kind(), &StorageErrorKind::PermissionDenied);
    }

    #[test]
    fn test_set_content_overwrites() {
        let storage = storage();
        storage.set_content("Other.md", "changed");

        assert_eq!(
            storage.read(&DocumentRef::new("Other.md")).unwrap(),
            "changed"
        );
    }
}
