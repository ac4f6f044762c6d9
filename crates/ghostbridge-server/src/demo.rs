//! Demo handler served behind the bridge.

use axum::{
    Json, Router,
    body::Bytes,
    http::{Method, Uri},
    routing::{any, get},
};
use serde::Serialize;
use tower_http::trace::TraceLayer;

/// What `/echo` saw of the request.
#[derive(Debug, Serialize)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub body: String,
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(hello))
        .route("/echo", any(echo))
        .layer(TraceLayer::new_for_http())
}

async fn hello() -> &'static str {
    "Yay, it works!"
}

async fn echo(method: Method, uri: Uri, body: Bytes) -> Json<Echo> {
    Json(Echo {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}
