//! Application state.
//!
//! Shared state for all request handlers. Handlers only read it; the
//! [`VaultServer`](crate::VaultServer) controller owns every mutation.

use std::sync::{Arc, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};

use gmv_renderer::{ClassMap, MarkdownRenderer};
use gmv_storage::{DocumentRef, Storage};
use gmv_tree::{JsonExporter, ParseStrategy, TreeParser};

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Vault access.
    pub(crate) storage: Arc<dyn Storage>,
    /// Entry document of the next export.
    pub(crate) selected: RwLock<Option<DocumentRef>>,
    /// Base URL for page links (local or tunnel URL).
    pub(crate) base_url: RwLock<String>,
    /// Tree extraction strategy.
    pub(crate) strategy: ParseStrategy,
    /// Headings skipped in heading mode.
    pub(crate) ignore_headings: Vec<String>,
    /// Presentational classes for rendered pages.
    pub(crate) classes: ClassMap,
    /// Whether the listener is accepting requests.
    pub(crate) running: AtomicBool,
}

impl AppState {
    pub(crate) fn new(
        storage: Arc<dyn Storage>,
        strategy: ParseStrategy,
        ignore_headings: Vec<String>,
    ) -> Self {
        Self {
            storage,
            selected: RwLock::new(None),
            base_url: RwLock::new(String::new()),
            strategy,
            ignore_headings,
            classes: ClassMap::default(),
            running: AtomicBool::new(false),
        }
    }

    pub(crate) fn selected_entry(&self) -> Option<DocumentRef> {
        self.selected.read().unwrap().clone()
    }

    pub(crate) fn base_url(&self) -> String {
        self.base_url.read().unwrap().clone()
    }

    pub(crate) fn set_base_url(&self, url: &str) {
        *self.base_url.write().unwrap() = url.trim_end_matches('/').to_owned();
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    /// Parser for the configured strategy.
    pub(crate) fn parser(&self) -> Box<dyn TreeParser> {
        self.strategy.parser(&self.ignore_headings)
    }

    /// Exporter bound to the current base URL.
    pub(crate) fn exporter(&self) -> JsonExporter {
        JsonExporter::new(self.base_url())
    }

    /// Renderer bound to the current base URL.
    pub(crate) fn renderer(&self) -> MarkdownRenderer {
        MarkdownRenderer::new()
            .with_base_url(self.base_url())
            .with_classes(self.classes.clone())
    }
}
