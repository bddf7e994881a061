//! Loopback content server for gm-vault.
//!
//! Serves the exported vault tree and rendered pages to an external
//! visualization tool:
//!
//! - `GET /gm-vault` - JSON tree of the selected entry document
//! - `GET /pages/:slug` - a vault document rendered to HTML
//! - `GET /health` - liveness probe
//!
//! [`VaultServer`] owns all mutable state: the selected entry document, the
//! running listener and the tunnel. Every request re-reads the vault.
//!
//! # Quick Start
//!
//! ```ignore
//! use gmv_server::{ServerConfig, VaultServer};
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = VaultServer::new(ServerConfig::default());
//!     server.select_entry("Campaign/Index.md".into());
//!     let addr = server.start().await.unwrap();
//!     println!("http://{addr}/gm-vault");
//!     gmv_server::shutdown_signal().await;
//!     server.stop().await;
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! External tool ──HTTP──► axum (CORS, trace) ──► RouteTable ──► handler
//!                                                                 │
//!                                       spawn_blocking ◄──────────┘
//!                                             │
//!                                             ├─► TreeParser ──► JsonExporter
//!                                             └─► MarkdownRenderer
//! ```

mod app;
mod error;
mod handlers;
mod routes;
mod state;
mod tunnel;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};

use gmv_config::is_loopback_host;
use gmv_storage::{DocumentRef, FsStorage, Storage};
use gmv_tree::{DEFAULT_IGNORE_HEADINGS, ParseStrategy};
use state::AppState;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub use error::ServerError;
pub use routes::{Params, RouteTable, not_found, send_html, send_json};
pub use tunnel::{StaticTunnel, Tunnel, TunnelError};

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Loopback host to bind to.
    pub host: String,
    /// Port to listen on (0 picks a free port).
    pub port: u16,
    /// Vault root directory.
    pub vault_root: PathBuf,
    /// Tree extraction strategy.
    pub strategy: ParseStrategy,
    /// Headings skipped in heading mode.
    pub ignore_headings: Vec<String>,
    /// Public URL of an externally managed tunnel.
    pub public_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 3000,
            vault_root: PathBuf::from("."),
            strategy: ParseStrategy::default(),
            ignore_headings: DEFAULT_IGNORE_HEADINGS
                .iter()
                .map(|&h| h.to_owned())
                .collect(),
            public_url: None,
        }
    }
}

/// Create server configuration from gm-vault config.
#[must_use]
pub fn server_config_from_gmv_config(config: &gmv_config::Config) -> ServerConfig {
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        vault_root: config.vault_resolved.root.clone(),
        strategy: config.export.mode,
        ignore_headings: config.export.ignore_headings.clone(),
        public_url: config.tunnel.public_url.clone(),
    }
}

/// A listener accepting requests.
struct RunningServer {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Content server controller.
pub struct VaultServer {
    config: ServerConfig,
    state: Arc<AppState>,
    running: tokio::sync::Mutex<Option<RunningServer>>,
    local_addr: RwLock<Option<SocketAddr>>,
    tunnel: Mutex<Box<dyn Tunnel>>,
}

impl VaultServer {
    /// Create a server over the filesystem vault at `config.vault_root`.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        let storage = Arc::new(FsStorage::new(config.vault_root.clone()));
        Self::with_storage(config, storage)
    }

    /// Create a server over an arbitrary storage backend.
    #[must_use]
    pub fn with_storage(config: ServerConfig, storage: Arc<dyn Storage>) -> Self {
        let state = AppState::new(storage, config.strategy, config.ignore_headings.clone());
        let tunnel = Box::new(StaticTunnel::new(config.public_url.clone()));
        Self {
            config,
            state: Arc::new(state),
            running: tokio::sync::Mutex::new(None),
            local_addr: RwLock::new(None),
            tunnel: Mutex::new(tunnel),
        }
    }

    /// Replace the tunnel implementation.
    #[must_use]
    pub fn with_tunnel(self, tunnel: Box<dyn Tunnel>) -> Self {
        *self.tunnel.lock().unwrap() = tunnel;
        self
    }

    /// Select the entry document for `/gm-vault`.
    pub fn select_entry(&self, entry: DocumentRef) {
        tracing::info!(entry = %entry, "Entry document selected");
        *self.state.selected.write().unwrap() = Some(entry);
    }

    /// Clear the selected entry document.
    pub fn clear_selection(&self) {
        *self.state.selected.write().unwrap() = None;
    }

    /// Currently selected entry document.
    #[must_use]
    pub fn selected_entry(&self) -> Option<DocumentRef> {
        self.state.selected_entry()
    }

    /// Start listening.
    ///
    /// Calling `start` on a running server returns the bound address without
    /// binding again.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::NonLoopback`] if the host isn't a loopback
    /// address and [`ServerError::Bind`] if the listener can't be bound. The
    /// server stays stopped on error.
    pub async fn start(&self) -> Result<SocketAddr, ServerError> {
        let mut running = self.running.lock().await;
        if let Some(server) = running.as_ref() {
            return Ok(server.addr);
        }

        let addr = loopback_addr(&self.config.host, self.config.port)?;
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::bind(addr, e))?;
        let addr = listener.local_addr().map_err(|e| ServerError::bind(addr, e))?;

        *self.local_addr.write().unwrap() = Some(addr);
        if !self.tunnel.lock().unwrap().is_active() {
            self.state.set_base_url(&self.local_url());
        }

        let app = app::create_router(Arc::clone(&self.state));
        let (shutdown, signal) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = signal.await;
                })
                .await;
            if let Err(err) = result {
                tracing::error!(error = %err, "Server terminated");
            }
        });

        self.state.set_running(true);
        tracing::info!(address = %addr, "Server started");

        *running = Some(RunningServer {
            addr,
            shutdown,
            task,
        });
        Ok(addr)
    }

    /// Stop listening and close the tunnel. Stopping a stopped server does nothing.
    pub async fn stop(&self) {
        let Some(server) = self.running.lock().await.take() else {
            return;
        };

        self.close_tunnel();
        self.state.set_running(false);
        let _ = server.shutdown.send(());
        if let Err(err) = server.task.await {
            tracing::warn!(error = %err, "Server task failed");
        }
        *self.local_addr.write().unwrap() = None;
        tracing::info!(address = %server.addr, "Server stopped");
    }

    /// Whether the server is accepting requests.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Bound address while running.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.read().unwrap()
    }

    /// Loopback URL of the server.
    ///
    /// Uses the bound address while running and the configured one otherwise.
    #[must_use]
    pub fn local_url(&self) -> String {
        match self.local_addr() {
            Some(addr) => format!("http://{addr}"),
            None => match loopback_addr(&self.config.host, self.config.port) {
                Ok(addr) => format!("http://{addr}"),
                Err(_) => format!("http://{}:{}", self.config.host, self.config.port),
            },
        }
    }

    /// Base URL currently used for page links.
    #[must_use]
    pub fn base_url(&self) -> String {
        self.state.base_url()
    }

    /// Open the tunnel and switch page links to its public URL.
    ///
    /// Opening an open tunnel returns its URL.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::NotRunning`] if the server isn't running and
    /// [`ServerError::Tunnel`] if the tunnel can't be opened.
    pub fn open_tunnel(&self) -> Result<String, ServerError> {
        if !self.is_running() {
            return Err(ServerError::NotRunning);
        }

        let mut tunnel = self.tunnel.lock().unwrap();
        if let Some(url) = tunnel.public_url() {
            return Ok(url);
        }

        let url = tunnel.start(&self.local_url())?;
        self.state.set_base_url(&url);
        Ok(url)
    }

    /// Close the tunnel and switch page links back to the local URL.
    pub fn close_tunnel(&self) {
        let mut tunnel = self.tunnel.lock().unwrap();
        if tunnel.is_active() {
            tunnel.stop();
            self.state.set_base_url(&self.local_url());
        }
    }

    /// Public URL while the tunnel is open.
    #[must_use]
    pub fn public_url(&self) -> Option<String> {
        self.tunnel.lock().unwrap().public_url()
    }
}

/// Resolve a loopback host to a socket address.
fn loopback_addr(host: &str, port: u16) -> Result<SocketAddr, ServerError> {
    if !is_loopback_host(host) {
        return Err(ServerError::NonLoopback(host.to_owned()));
    }

    let trimmed = host.trim_start_matches('[').trim_end_matches(']');
    let ip = if trimmed.eq_ignore_ascii_case("localhost") {
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    } else {
        trimmed
            .parse()
            .map_err(|_| ServerError::NonLoopback(host.to_owned()))?
    };
    Ok(SocketAddr::new(ip, port))
}

/// Wait for shutdown signal (Ctrl-C).
pub async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
