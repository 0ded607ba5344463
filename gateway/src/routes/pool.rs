//! Pool diagnostics and registry management.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::pool::{PoolSnapshot, WorkerNode};
use crate::AppState;

#[derive(Debug, Serialize)]
struct MembershipResponse {
    worker: WorkerNode,
    changed: bool,
}

/// GET /pool - a fresh vitals round over the registry.
async fn pool(State(state): State<Arc<AppState>>) -> Json<PoolSnapshot> {
    Json(state.gateway.pool_snapshot().await)
}

/// GET /workers - registered workers in insertion order.
async fn list_workers(State(state): State<Arc<AppState>>) -> Json<Vec<WorkerNode>> {
    Json(state.gateway.registry().list().await)
}

/// POST /workers - add a worker to the pool.
async fn add_worker(
    State(state): State<Arc<AppState>>,
    Json(worker): Json<WorkerNode>,
) -> Json<MembershipResponse> {
    let changed = state.gateway.registry().add(worker.clone()).await;
    Json(MembershipResponse { worker, changed })
}

/// DELETE /workers - remove a worker from the pool.
async fn remove_worker(
    State(state): State<Arc<AppState>>,
    Json(worker): Json<WorkerNode>,
) -> Json<MembershipResponse> {
    let changed = state.gateway.registry().remove(&worker).await;
    Json(MembershipResponse { worker, changed })
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/pool", get(pool))
        .route(
            "/workers",
            get(list_workers).post(add_worker).delete(remove_worker),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::{read_json, test_state};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    const WORKER: &str =
        r#"{"heartbeat":"http://127.0.0.1:6666","execution":"http://127.0.0.1:9000"}"#;

    fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_add_and_remove_worker() {
        let state = test_state();
        let app = router(state.clone());

        let response = app.clone().oneshot(json_request("POST", "/workers", WORKER)).await;
        let body = read_json(response.unwrap()).await;
        assert_eq!(body["changed"], true);
        assert_eq!(body["worker"]["execution"], "http://127.0.0.1:9000");

        let response = app.clone().oneshot(json_request("POST", "/workers", WORKER)).await;
        let body = read_json(response.unwrap()).await;
        assert_eq!(body["changed"], false);
        assert_eq!(state.gateway.registry().len().await, 1);

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/workers").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(read_json(response).await.as_array().map(Vec::len), Some(1));

        let response = app.clone().oneshot(json_request("DELETE", "/workers", WORKER)).await;
        let body = read_json(response.unwrap()).await;
        assert_eq!(body["changed"], true);
        assert!(state.gateway.registry().is_empty().await);
    }

    #[tokio::test]
    async fn test_invalid_address_is_rejected() {
        let response = router(test_state())
            .oneshot(json_request(
                "POST",
                "/workers",
                r#"{"heartbeat":"127.0.0.1","execution":"http://127.0.0.1:9000"}"#,
            ))
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_empty_pool_snapshot() {
        let response = router(test_state())
            .oneshot(Request::builder().uri("/pool").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await, json!({"entries": []}));
    }
}
