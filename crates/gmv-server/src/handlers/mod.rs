//! HTTP request handlers.
//!
//! Handlers take the shared state and the bound path parameters. Parse and
//! render work runs on the blocking pool since storage is synchronous.

pub(crate) mod health;
pub(crate) mod pages;
pub(crate) mod vault;
