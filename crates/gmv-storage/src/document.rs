//! Vault paths: documents and folder entries.

use std::fmt;

/// Markdown file extension (compared case-insensitively).
const MARKDOWN_EXTENSION: &str = "md";

/// Reference to a single document inside the vault.
///
/// Holds a vault-relative path with `/` separators, e.g. `"Campaign/Index.md"`.
/// Leading `./` and `/` are stripped and backslashes are normalized on construction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentRef {
    path: String,
}

impl DocumentRef {
    /// Create a document reference from a vault-relative path.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        let raw: String = path.into();
        let mut normalized = raw.replace('\\', "/");
        while let Some(rest) = normalized.strip_prefix("./") {
            normalized = rest.to_owned();
        }
        let normalized = normalized.trim_start_matches('/').to_owned();
        Self { path: normalized }
    }

    /// Vault-relative path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// File name including extension (`"Index.md"`).
    #[must_use]
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// File name without its last extension (`"Index"`).
    ///
    /// Dot-files without another dot keep their full name.
    #[must_use]
    pub fn stem(&self) -> &str {
        let name = self.name();
        match name.rfind('.') {
            Some(0) | None => name,
            Some(pos) => &name[..pos],
        }
    }

    /// Last extension without the dot, if any.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        let name = self.name();
        match name.rfind('.') {
            Some(0) | None => None,
            Some(pos) => Some(&name[pos + 1..]),
        }
    }

    /// Path of the containing folder (`""` for the vault root).
    #[must_use]
    pub fn parent(&self) -> &str {
        self.path.rfind('/').map_or("", |pos| &self.path[..pos])
    }

    /// Whether the document has a markdown extension.
    #[must_use]
    pub fn is_markdown(&self) -> bool {
        self.extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(MARKDOWN_EXTENSION))
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl From<&str> for DocumentRef {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// A child of a vault folder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Entry {
    /// Sub-folder with its vault-relative path and display name.
    Folder {
        /// Vault-relative folder path.
        path: String,
        /// Folder name (last path component).
        name: String,
    },
    /// Document inside the folder.
    File(DocumentRef),
}

impl Entry {
    /// Build a folder entry from a vault-relative path.
    #[must_use]
    pub fn folder(path: impl Into<String>) -> Self {
        let path: String = path.into();
        let name = path.rsplit('/').next().unwrap_or(&path).to_owned();
        Self::Folder { path, name }
    }

    /// Display name: folder name or file name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Folder { name, .. } => name,
            Self::File(doc) => doc.name(),
        }
    }
}

/// Join a folder path and a child name using `/`.
pub(crate) fn join(folder: &str, name: &str) -> String {
    if folder.is_empty() {
        name.to_owned()
    } else {
        format!("{folder}/{name}")
    }
}
