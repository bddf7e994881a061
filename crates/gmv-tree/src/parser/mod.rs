//! Tree parsers.
//!
//! Two strategies build a [`Session`] from the vault:
//!
//! - [`FolderParser`] turns the folder containing the entry document into a
//!   category tree
//! - [`HeadingParser`] reads the entry document and turns its headings and
//!   `[[cross-references]]` into categories and pages
//!
//! Callers pick one explicitly through [`ParseStrategy`].

mod folder;
mod headings;

use std::fmt;
use std::str::FromStr;

use gmv_storage::{DocumentRef, Storage, StorageError};
use serde::{Deserialize, Serialize};

use crate::model::Session;

pub use folder::FolderParser;
pub use headings::{DEFAULT_IGNORE_HEADINGS, HeadingMode, HeadingParser};

/// Error building a session.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The export root folder could not be listed.
    #[error("Failed to list export root '{path}': {source}")]
    ListRoot {
        /// Vault-relative folder path.
        path: String,
        /// Underlying storage error.
        #[source]
        source: StorageError,
    },
    /// The entry document could not be read.
    #[error("Failed to read entry document '{path}': {source}")]
    ReadEntry {
        /// Vault-relative document path.
        path: String,
        /// Underlying storage error.
        #[source]
        source: StorageError,
    },
}

/// Builds a [`Session`] rooted at an entry document.
pub trait TreeParser: Send + Sync {
    /// Parse the vault starting from `entry`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] only when the export cannot start at all;
    /// individual unreadable documents degrade to fallback names.
    fn parse(&self, storage: &dyn Storage, entry: &DocumentRef) -> Result<Session, ParseError>;
}

/// How a session is extracted from the vault.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ParseStrategy {
    /// Folder hierarchy around the entry document.
    #[default]
    Folder,
    /// Headings inside the entry document.
    Headings(HeadingMode),
}

impl ParseStrategy {
    /// Build the parser for this strategy.
    ///
    /// `ignore_headings` only applies to [`HeadingMode::Structured`].
    #[must_use]
    pub fn parser(self, ignore_headings: &[String]) -> Box<dyn TreeParser> {
        match self {
            Self::Folder => Box::new(FolderParser),
            Self::Headings(mode) => {
                Box::new(HeadingParser::new(mode).with_ignore_headings(ignore_headings.to_vec()))
            }
        }
    }

    /// Configuration name (`folder`, `headings`, `headings-flat`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::Headings(HeadingMode::Structured) => "headings",
            Self::Headings(HeadingMode::Flat) => "headings-flat",
        }
    }
}

impl fmt::Display for ParseStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized strategy name.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("Unknown export mode '{0}' (expected folder, headings or headings-flat)")]
pub struct UnknownStrategy(String);

impl FromStr for ParseStrategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "folder" => Ok(Self::Folder),
            "headings" => Ok(Self::Headings(HeadingMode::Structured)),
            "headings-flat" => Ok(Self::Headings(HeadingMode::Flat)),
            _ => Err(UnknownStrategy(s.to_owned())),
        }
    }
}

impl TryFrom<String> for ParseStrategy {
    type Error = UnknownStrategy;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ParseStrategy> for String {
    fn from(strategy: ParseStrategy) -> Self {
        strategy.as_str().to_owned()
    }
}

/// Read a document's display name: its first `#` heading, else its file stem.
///
/// Read failures are logged and fall back to the stem.
pub(crate) fn document_title(storage: &dyn Storage, doc: &DocumentRef) -> String {
    match storage.read(doc) {
        Ok(text) => crate::scan::first_heading(&text).unwrap_or_else(|| doc.stem().to_owned()),
        Err(err) => {
            tracing::warn!(path = %doc, error = %err, "Failed to read document, using file name");
            doc.stem().to_owned()
        }
    }
}
