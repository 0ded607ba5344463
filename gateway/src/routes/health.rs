use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Registry-level gauges; no workers are probed.
async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    let version = env!("CARGO_PKG_VERSION");
    let workers = state.gateway.registry().len().await;
    let strategy = state.gateway.strategy().name();
    let body = format!(
        "# HELP taskgate_up Whether the gateway is up\n\
         # TYPE taskgate_up gauge\n\
         taskgate_up 1\n\
         # HELP taskgate_workers_registered Workers in the pool\n\
         # TYPE taskgate_workers_registered gauge\n\
         taskgate_workers_registered {}\n\
         # HELP taskgate_info Gateway information\n\
         # TYPE taskgate_info gauge\n\
         taskgate_info{{version=\"{}\",strategy=\"{}\"}} 1\n",
        workers, version, strategy
    );
    (StatusCode::OK, [(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(state)
}
