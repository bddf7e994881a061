//! Vault access abstraction for gm-vault.
//!
//! This crate provides a [`Storage`] trait for reading a note vault: listing
//! folder children, reading document text and enumerating every markdown
//! document. Folder and file children are told apart by the [`Entry`] enum
//! rather than by probing capabilities at runtime.
//!
//! # Architecture
//!
//! The crate provides:
//! - [`Storage`] trait with `list()`, `read()` and `documents()` methods
//! - [`FsStorage`] implementation for a vault on the local filesystem
//! - [`MockStorage`] for testing (behind `mock` feature flag)
//!
//! # Path Convention
//!
//! Paths are vault-relative and always use `/` as separator. The vault root
//! folder is `""`.
//!
//! # Example
//!
//! ```ignore
//! use std::path::PathBuf;
//! use gmv_storage::{Entry, FsStorage, Storage};
//!
//! let storage = FsStorage::new(PathBuf::from("vault"));
//! for entry in storage.list("")? {
//!     match entry {
//!         Entry::Folder { name, .. } => println!("{name}/"),
//!         Entry::File(doc) => println!("{}", doc.name()),
//!     }
//! }
//! ```

mod document;
mod fs;
#[cfg(feature = "mock")]
mod mock;
mod storage;

pub use document::{DocumentRef, Entry};
pub use fs::FsStorage;
#[cfg(feature = "mock")]
pub use mock::MockStorage;
pub use storage::{Storage, StorageError, StorageErrorKind};
