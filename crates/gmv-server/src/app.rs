//! Router construction.
//!
//! Requests are matched against a [`RouteTable`] from a single axum fallback,
//! so path patterns keep `:param` semantics independent of axum's router.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::{Method, Uri};
use axum::response::{IntoResponse, Response};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::routes::{Params, RouteTable, not_found};
use crate::state::AppState;

/// Future returned by a route handler.
pub(crate) type HandlerFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// Route handler.
pub(crate) type Handler = fn(Arc<AppState>, Params) -> HandlerFuture;

/// State of the dispatching fallback.
#[derive(Clone)]
struct Dispatcher {
    routes: Arc<RouteTable<Handler>>,
    state: Arc<AppState>,
}

/// Routes served by the content server.
pub(crate) fn route_table() -> RouteTable<Handler> {
    let mut routes: RouteTable<Handler> = RouteTable::new();
    routes.register_route(Method::GET, "/gm-vault", vault);
    routes.register_route(Method::GET, "/pages/:slug", page);
    routes.register_route(Method::GET, "/health", health);
    routes
}

fn vault(state: Arc<AppState>, params: Params) -> HandlerFuture {
    Box::pin(async move {
        handlers::vault::get_vault(state, params)
            .await
            .into_response()
    })
}

fn page(state: Arc<AppState>, params: Params) -> HandlerFuture {
    Box::pin(async move {
        handlers::pages::get_page(state, params)
            .await
            .into_response()
    })
}

fn health(state: Arc<AppState>, params: Params) -> HandlerFuture {
    Box::pin(handlers::health::get_health(state, params))
}

/// Create the application router.
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    let dispatcher = Dispatcher {
        routes: Arc::new(route_table()),
        state,
    };

    Router::new()
        .fallback(dispatch)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(dispatcher)
}

async fn dispatch(State(dispatcher): State<Dispatcher>, method: Method, uri: Uri) -> Response {
    let path = uri.path();
    match dispatcher.routes.dispatch(&method, path) {
        Some((handler, params)) => {
            tracing::debug!(%method, path, "Dispatching request");
            handler(Arc::clone(&dispatcher.state), params).await
        }
        None => {
            tracing::debug!(%method, path, "No route");
            not_found()
        }
    }
}
