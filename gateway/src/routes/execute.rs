//! POST /execute - run the bound task on a pool worker.

use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::Value;
use taskgate_common::{ExecutionResult, Kwargs};

use crate::error::GatewayError;
use crate::AppState;

/// Call-time arguments for the bound task.
#[derive(Debug, Default, Deserialize)]
pub struct ExecuteRequest {
    /// Replaces the setup positionals when present.
    #[serde(default)]
    pub args: Option<Vec<Value>>,
    #[serde(default)]
    pub kwargs: Kwargs,
    /// Falls back to the configured criteria.
    #[serde(default)]
    pub criteria: Option<String>,
}

async fn execute(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExecuteRequest>,
) -> Result<Json<ExecutionResult>, GatewayError> {
    let criteria = request.criteria.as_deref().unwrap_or(&state.default_criteria);
    let result = state
        .gateway
        .execute(request.args, request.kwargs, criteria)
        .await?;
    Ok(Json(result))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/execute", post(execute))
        .with_state(state)
}
