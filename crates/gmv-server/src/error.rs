//! Error types for the content server.

use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gmv_storage::StorageError;
use gmv_tree::ParseError;
use serde_json::json;

use crate::routes::send_json;
use crate::tunnel::TunnelError;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// No entry document is selected.
    #[error("No entry document selected")]
    NotSelected,

    /// No vault document matches the requested slug.
    #[error("Page not found: {0}")]
    PageNotFound(String),

    /// Tree extraction failed.
    #[error("Export failed: {0}")]
    Parse(#[from] ParseError),

    /// Document could not be read.
    #[error("Failed to read document: {0}")]
    Storage(#[from] StorageError),

    /// JSON serialization failed.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A blocking handler task panicked or was cancelled.
    #[error("Handler task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Host is not a loopback address.
    #[error("Refusing to bind non-loopback host '{0}'")]
    NonLoopback(String),

    /// Listener could not be bound.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Operation needs a running server.
    #[error("Server is not running")]
    NotRunning,

    /// Tunnel could not be opened.
    #[error("Tunnel error: {0}")]
    Tunnel(#[from] TunnelError),
}

impl ServerError {
    /// Build a bind error for a socket address.
    pub(crate) fn bind(addr: SocketAddr, source: std::io::Error) -> Self {
        Self::Bind {
            addr: addr.to_string(),
            source,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::NotSelected => StatusCode::BAD_REQUEST,
            Self::PageNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self, "Request failed");
        }

        let body = match &self {
            Self::PageNotFound(slug) => json!({"error": "Page not found", "slug": slug}),
            other => json!({"error": other.to_string()}),
        };

        send_json(&body, status)
    }
}
