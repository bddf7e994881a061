//! Vault tree endpoint.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::Response;

use crate::error::ServerError;
use crate::routes::{Params, send_json};
use crate::state::AppState;

/// Handle GET /gm-vault.
///
/// Parses the selected entry document with the configured strategy and
/// returns the exported tree.
pub(crate) async fn get_vault(state: Arc<AppState>, _params: Params) -> Result<Response, ServerError> {
    let entry = state.selected_entry().ok_or(ServerError::NotSelected)?;

    let export = tokio::task::spawn_blocking(move || {
        let session = state.parser().parse(state.storage.as_ref(), &entry)?;
        tracing::debug!(
            entry = %entry,
            categories = session.categories.len(),
            "Exported vault tree"
        );
        Ok::<_, ServerError>(state.exporter().build_json(&session))
    })
    .await??;

    Ok(send_json(&export, StatusCode::OK))
}
