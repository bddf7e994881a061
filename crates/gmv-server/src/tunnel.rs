//! Public tunnel contract.
//!
//! A tunnel exposes the loopback listener under a public HTTPS address. While
//! a tunnel is open, exported page URLs use its public URL.

/// Tunnel error.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TunnelError {
    /// No public URL is known for the tunnel.
    #[error("No public URL configured (set tunnel.public_url or --public-url)")]
    NotConfigured,
    /// Tunnel provider failed.
    #[error("{0}")]
    Failed(String),
}

/// Lifecycle of a public tunnel.
pub trait Tunnel: Send + Sync {
    /// Open the tunnel towards `local_url` and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns [`TunnelError`] if the tunnel can't be opened.
    fn start(&mut self, local_url: &str) -> Result<String, TunnelError>;

    /// Close the tunnel. Closing an inactive tunnel does nothing.
    fn stop(&mut self);

    /// Whether the tunnel is open.
    fn is_active(&self) -> bool;

    /// Public URL while the tunnel is open.
    fn public_url(&self) -> Option<String>;
}

/// Tunnel run outside this process, known only by its public URL.
#[derive(Debug, Default)]
pub struct StaticTunnel {
    url: Option<String>,
    active: bool,
}

impl StaticTunnel {
    /// Create a tunnel for an externally managed public URL.
    #[must_use]
    pub fn new(url: Option<String>) -> Self {
        Self {
            url: url.map(|u| u.trim_end_matches('/').to_owned()),
            active: false,
        }
    }
}

impl Tunnel for StaticTunnel {
    fn start(&mut self, local_url: &str) -> Result<String, TunnelError> {
        let url = self.url.clone().ok_or(TunnelError::NotConfigured)?;
        self.active = true;
        tracing::info!(local = %local_url, public = %url, "Tunnel opened");
        Ok(url)
    }

    fn stop(&mut self) {
        if self.active {
            self.active = false;
            tracing::info!("Tunnel closed");
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn public_url(&self) -> Option<String> {
        if self.active { self.url.clone() } else { None }
    }
}
