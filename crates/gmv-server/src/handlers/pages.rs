//! Rendered page endpoint.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::Response;
use gmv_renderer::slugify;
use gmv_storage::{DocumentRef, Storage};
use gmv_tree::first_heading;
use percent_encoding::percent_decode_str;

use crate::error::ServerError;
use crate::routes::{Params, send_html};
use crate::state::AppState;

/// Handle GET /pages/:slug.
pub(crate) async fn get_page(state: Arc<AppState>, params: Params) -> Result<Response, ServerError> {
    let raw = params.get("slug").unwrap_or_default();
    let slug = percent_decode_str(raw).decode_utf8_lossy().into_owned();

    let html = tokio::task::spawn_blocking(move || {
        let doc = resolve_page(state.storage.as_ref(), &slug)?
            .ok_or_else(|| ServerError::PageNotFound(slug.clone()))?;
        let text = state.storage.read(&doc)?;
        let title = first_heading(&text).unwrap_or_else(|| doc.stem().to_owned());
        tracing::debug!(slug = %slug, document = %doc, "Rendering page");
        Ok::<_, ServerError>(state.renderer().render_page(&text, &title))
    })
    .await??;

    Ok(send_html(html, StatusCode::OK))
}

/// Find the document a slug refers to.
///
/// A document matches when its slugified base name equals the slug, or when
/// its base name equals the slug ignoring case. Documents are tried in path
/// order; the first match wins.
fn resolve_page(storage: &dyn Storage, slug: &str) -> Result<Option<DocumentRef>, ServerError> {
    let wanted = slug.to_lowercase();
    let found = storage.documents()?.into_iter().find(|doc| {
        let stem = doc.stem();
        slugify(stem) == slug || stem.to_lowercase() == wanted
    });
    Ok(found)
}
