//! Method and path-pattern routing.
//!
//! Patterns are `/`-separated; a `:name` segment matches exactly one
//! non-empty path component and binds it in [`Params`]. Routes are tried in
//! registration order and the first match wins.

use std::collections::HashMap;

use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;

/// Path parameters bound by a matched pattern.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params(HashMap<String, String>);

impl Params {
    /// Value bound to `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

#[derive(Debug)]
enum Segment {
    Literal(String),
    Param(String),
}

struct Route<H> {
    method: Method,
    segments: Vec<Segment>,
    handler: H,
}

impl<H> Route<H> {
    fn matches(&self, method: &Method, path: &[&str]) -> Option<Params> {
        if self.method != *method || self.segments.len() != path.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (segment, component) in self.segments.iter().zip(path) {
            match segment {
                Segment::Literal(literal) if literal.as_str() == *component => {}
                Segment::Param(name) if !component.is_empty() => {
                    params.insert(name.clone(), (*component).to_owned());
                }
                _ => return None,
            }
        }
        Some(Params(params))
    }
}

/// Ordered route table.
pub struct RouteTable<H> {
    routes: Vec<Route<H>>,
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<H> RouteTable<H> {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `method` and `pattern` (e.g. `/pages/:slug`).
    pub fn register_route(&mut self, method: Method, pattern: &str, handler: H) {
        let segments = split_path(pattern)
            .into_iter()
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) => Segment::Param(name.to_owned()),
                None => Segment::Literal(segment.to_owned()),
            })
            .collect();

        self.routes.push(Route {
            method,
            segments,
            handler,
        });
    }

    /// Find the first route matching `method` and `path`.
    ///
    /// The query string, if present, is ignored.
    #[must_use]
    pub fn dispatch(&self, method: &Method, path: &str) -> Option<(&H, Params)> {
        let path = path.split_once('?').map_or(path, |(p, _)| p);
        let components = split_path(path);

        self.routes.iter().find_map(|route| {
            route
                .matches(method, &components)
                .map(|params| (&route.handler, params))
        })
    }
}

fn split_path(path: &str) -> Vec<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

/// JSON response with the given status.
pub fn send_json<T: Serialize + ?Sized>(body: &T, status: StatusCode) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => (
            status,
            [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            bytes,
        )
            .into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "Failed to serialize response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// HTML response with the given status.
pub fn send_html(body: String, status: StatusCode) -> Response {
    (
        status,
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        )],
        body,
    )
        .into_response()
}

/// 404 response for unmatched requests.
pub fn not_found() -> Response {
    send_json(&json!({"error": "Not found"}), StatusCode::NOT_FOUND)
}
