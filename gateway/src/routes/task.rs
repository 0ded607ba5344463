//! Bound task inspection and rebinding.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use taskgate_common::Task;

use crate::AppState;

/// GET /task - the task currently bound.
async fn current_task(State(state): State<Arc<AppState>>) -> Json<Task> {
    Json(state.gateway.task().await)
}

/// PUT /task - bind a different task for subsequent calls.
async fn replace_task(State(state): State<Arc<AppState>>, Json(task): Json<Task>) -> StatusCode {
    state.gateway.set_task(task).await;
    StatusCode::NO_CONTENT
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/task", get(current_task).put(replace_task))
        .with_state(state)
}
