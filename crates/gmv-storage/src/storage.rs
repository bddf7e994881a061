//! Storage trait and error types.
//!
//! Provides the core [`Storage`] trait for reading a vault, along with
//! [`StorageError`] for unified error handling across backends.

use std::path::PathBuf;

use crate::document::{DocumentRef, Entry};

/// Semantic error categories.
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageErrorKind {
    /// Resource does not exist.
    NotFound,
    /// Permission denied.
    PermissionDenied,
    /// Invalid path or identifier.
    InvalidPath,
    /// Path exists but is not a folder.
    NotAFolder,
    /// Content is not valid UTF-8 text.
    InvalidData,
    /// Other/unknown error category.
    Other,
}

/// Storage error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct StorageError {
    kind: StorageErrorKind,
    path: Option<PathBuf>,
    backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    /// Create a new storage error.
    #[must_use]
    pub fn new(kind: StorageErrorKind) -> Self {
        Self {
            kind,
            path: None,
            backend: None,
            source: None,
        }
    }

    /// Attach path context.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Semantic error category.
    #[must_use]
    pub fn kind(&self) -> &StorageErrorKind {
        &self.kind
    }

    /// Path context, if any.
    #[must_use]
    pub fn path(&self) -> Option<&std::path::Path> {
        self.path.as_deref()
    }

    /// Backend identifier, if any.
    #[must_use]
    pub fn backend(&self) -> Option<&'static str> {
        self.backend
    }

    /// Create a not found error with path.
    #[must_use]
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::new(StorageErrorKind::NotFound).with_path(path)
    }

    /// Create a storage error from an I/O error.
    #[must_use]
    pub fn io(err: std::io::Error, path: Option<PathBuf>) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => StorageErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => StorageErrorKind::PermissionDenied,
            std::io::ErrorKind::NotADirectory => StorageErrorKind::NotAFolder,
            std::io::ErrorKind::InvalidData => StorageErrorKind::InvalidData,
            _ => StorageErrorKind::Other,
        };
        let mut error = Self::new(kind).with_source(err);
        if let Some(p) = path {
            error = error.with_path(p);
        }
        error
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: message (path: /foo/bar)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            StorageErrorKind::NotFound => "Not found",
            StorageErrorKind::PermissionDenied => "Permission denied",
            StorageErrorKind::InvalidPath => "Invalid path",
            StorageErrorKind::NotAFolder => "Not a folder",
            StorageErrorKind::InvalidData => "Invalid data",
            StorageErrorKind::Other => "Error",
        };

        write!(f, "{kind_str}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }

        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Read access to a note vault.
///
/// All paths are vault-relative with `/` separators; `""` is the vault root.
/// Implementations are synchronous; async callers move work onto a blocking
/// thread.
pub trait Storage: Send + Sync {
    /// List the direct children of a folder.
    ///
    /// Hidden entries (names starting with `.`) are never returned. Order is
    /// unspecified; callers sort.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the folder doesn't exist or can't be listed.
    fn list(&self, folder: &str) -> Result<Vec<Entry>, StorageError>;

    /// Read the full text of a document.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the document doesn't exist or can't be read.
    fn read(&self, doc: &DocumentRef) -> Result<String, StorageError>;

    /// Enumerate every markdown document in the vault, sorted by path.
    ///
    /// Sub-folders that can't be listed are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the vault root can't be listed.
    fn documents(&self) -> Result<Vec<DocumentRef>, StorageError> {
        let mut documents = Vec::new();
        let mut pending = vec![String::new()];
        let mut is_root = true;

        while let Some(folder) = pending.pop() {
            let entries = match self.list(&folder) {
                Ok(entries) => entries,
                Err(err) if !is_root => {
                    tracing::warn!(folder = %folder, error = %err, "Skipping unreadable folder");
                    continue;
                }
                Err(err) => return Err(err),
            };
            is_root = false;

            for entry in entries {
                match entry {
                    Entry::Folder { path, .. } => pending.push(path),
                    Entry::File(doc) if doc.is_markdown() => documents.push(doc),
                    Entry::File(_) => {}
                }
            }
        }

        documents.sort();
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn test_storage_error_new() {
        let err = StorageError::new(StorageErrorKind::NotFound);

        assert_eq!(err.kind(), &StorageErrorKind::NotFound);
        assert!(err.path().is_none());
        assert!(err.backend().is_none());
    }

    #[test]
    fn test_storage_error_with_path() {
        let err = StorageError::new(StorageErrorKind::NotFound).with_path("/foo/bar");

        assert_eq!(err.path(), Some(Path::new("/foo/bar")));
    }

    #[test]
    fn test_storage_error_with_backend() {
        let err = StorageError::new(StorageErrorKind::NotFound).with_backend("Fs");

        assert_eq!(err.backend(), Some("Fs"));
    }

    #[test]
    fn test_storage_error_io_not_found() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = StorageError::io(io_err, Some(PathBuf::from("/foo/bar")));

        assert_eq!(err.kind(), &StorageErrorKind::NotFound);
        assert_eq!(err.path(), Some(Path::new("/foo/bar")));
    }

    #[test]
    fn test_storage_error_io_permission_denied() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = StorageError::io(io_err, None);

        assert_eq!(err.kind(), &StorageErrorKind::PermissionDenied);
    }

    #[test]
    fn test_storage_error_io_invalid_data() {
        let io_err = std::io::Error::new(std::io::ErrorKind::InvalidData, "not utf-8");
        let err = StorageError::io(io_err, None);

        assert_eq!(err.kind(), &StorageErrorKind::InvalidData);
    }

    #[test]
    fn test_storage_error_display_simple() {
        let err = StorageError::new(StorageErrorKind::NotFound);

        assert_eq!(err.to_string(), "Not found");
    }

    #[test]
    fn test_storage_error_display_full() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = StorageError::new(StorageErrorKind::NotFound)
            .with_backend("Fs")
            .with_path("/foo/bar")
            .with_source(io_err);

        assert_eq!(
            err.to_string(),
            "[Fs] Not found: file not found (path: /foo/bar)"
        );
    }

    #[test]
    fn test_storage_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StorageError>();
    }

    struct TwoLevel;

    impl Storage for TwoLevel {
        fn list(&self, folder: &str) -> Result<Vec<Entry>, StorageError> {
            match folder {
                "" => Ok(vec![
                    Entry::File(DocumentRef::new("b.md")),
                    Entry::folder("sub"),
                    Entry::folder("locked"),
                    Entry::File(DocumentRef::new("map.png")),
                ]),
                "sub" => Ok(vec![Entry::File(DocumentRef::new("sub/a.md"))]),
                _ => Err(StorageError::new(StorageErrorKind::PermissionDenied)),
            }
        }

        fn read(&self, doc: &DocumentRef) -> Result<String, StorageError> {
            Err(StorageError::not_found(doc.path()))
        }
    }

    #[test]
    fn test_documents_walks_recursively_and_sorts() {
        let docs = TwoLevel.documents().unwrap();
        let paths: Vec<&str> = docs.iter().map(DocumentRef::path).collect();

        assert_eq!(paths, vec!["b.md", "sub/a.md"]);
    }
}
