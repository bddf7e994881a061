//! Filesystem storage implementation.
//!
//! Provides [`FsStorage`] for reading a vault from the local filesystem.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::document::{DocumentRef, Entry, join};
use crate::storage::{Storage, StorageError, StorageErrorKind};

/// Backend identifier for error messages.
const BACKEND: &str = "Fs";

/// Filesystem storage implementation.
///
/// Every call goes to the filesystem; nothing is cached so responses always
/// reflect the latest edits.
///
/// # Example
///
/// ```ignore
/// use std::path::PathBuf;
/// use gmv_storage::{DocumentRef, FsStorage, Storage};
///
/// let storage = FsStorage::new(PathBuf::from("vault"));
/// let text = storage.read(&DocumentRef::new("Campaign/Index.md"))?;
/// ```
#[derive(Clone, Debug)]
pub struct FsStorage {
    /// Vault root directory.
    root: PathBuf,
}

impl FsStorage {
    /// Create a new filesystem storage rooted at `root`.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Vault root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate that a path doesn't escape the vault root.
    ///
    /// Rejects parent directory components (`..`) and absolute prefixes.
    fn validate_path(path: &str) -> Result<(), StorageError> {
        let escapes = Path::new(path).components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });

        if escapes {
            return Err(StorageError::new(StorageErrorKind::InvalidPath)
                .with_path(path)
                .with_backend(BACKEND));
        }
        Ok(())
    }

    /// Resolve a vault-relative path to a filesystem path.
    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        Self::validate_path(path)?;
        if path.is_empty() {
            Ok(self.root.clone())
        } else {
            Ok(self.root.join(path))
        }
    }
}

impl Storage for FsStorage {
    fn list(&self, folder: &str) -> Result<Vec<Entry>, StorageError> {
        let dir_path = self.resolve(folder)?;
        let entries = fs::read_dir(&dir_path)
            .map_err(|e| StorageError::io(e, Some(dir_path.clone())).with_backend(BACKEND))?;

        let mut children = Vec::new();
        for entry in entries.filter_map(Result::ok) {
            let name = entry.file_name().to_string_lossy().into_owned();

            // Skip hidden files and dirs (.obsidian, .trash, .git)
            if name.starts_with('.') {
                continue;
            }

            // Follows symlinks, so a linked folder lists as a folder.
            let is_dir = fs::metadata(entry.path()).is_ok_and(|m| m.is_dir());
            let path = join(folder, &name);
            if is_dir {
                children.push(Entry::Folder { path, name });
            } else {
                children.push(Entry::File(DocumentRef::new(path)));
            }
        }

        Ok(children)
    }

    fn read(&self, doc: &DocumentRef) -> Result<String, StorageError> {
        let full_path = self.resolve(doc.path())?;
        fs::read_to_string(&full_path)
            .map_err(|e| StorageError::io(e, Some(full_path.clone())).with_backend(BACKEND))
    }
}
