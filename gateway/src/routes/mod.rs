pub mod execute;
pub mod health;
pub mod pool;
pub mod task;

use std::sync::Arc;

use axum::{middleware, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::logging::request_logger;
use crate::AppState;

/// The gateway's full HTTP front.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(health::router(state.clone()))
        .merge(execute::router(state.clone()))
        .merge(task::router(state.clone()))
        .merge(pool::router(state))
        .layer(middleware::from_fn(request_logger))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
pub(crate) fn test_state() -> Arc<AppState> {
    test_state_with(crate::allocation::AllocationStrategy::fcfs())
}

#[cfg(test)]
pub(crate) fn test_state_with(strategy: crate::allocation::AllocationStrategy) -> Arc<AppState> {
    use crate::gateway::{Gateway, GatewaySettings};
    use crate::pool::WorkerRegistry;

    let gateway = Gateway::new(
        taskgate_common::Task::new("identity"),
        strategy,
        Arc::new(WorkerRegistry::new()),
        GatewaySettings::default(),
    );
    Arc::new(AppState {
        gateway: Arc::new(gateway),
        default_criteria: "cpu".to_string(),
    })
}

#[cfg(test)]
pub(crate) async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}
