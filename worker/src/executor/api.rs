//! Execution listener HTTP API.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use taskgate_common::{DispatchEnvelope, ExecutionResult, ARGS_PART, CODE_PART, KWARGS_PART};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::RemoteExecutor;
use crate::error::{Error, Result};

/// Build the execution router.
pub fn router(executor: Arc<RemoteExecutor>) -> Router {
    Router::new()
        .route("/", post(execute))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(executor)
}

/// Serve the execution endpoint on an already-bound listener.
pub async fn serve(listener: TcpListener, executor: Arc<RemoteExecutor>) -> std::io::Result<()> {
    axum::serve(listener, router(executor)).await
}

/// POST / - run a dispatched task.
async fn execute(
    State(executor): State<Arc<RemoteExecutor>>,
    multipart: Multipart,
) -> Result<Json<ExecutionResult>> {
    let envelope = read_envelope(multipart).await?;
    tracing::debug!(bytes = envelope.len(), "Received dispatch envelope");
    let result = executor.handle(&envelope).await?;
    Ok(Json(result))
}

/// Collect exactly the `code`, `args` and `kwargs` parts.
async fn read_envelope(mut multipart: Multipart) -> Result<DispatchEnvelope> {
    let mut code = None;
    let mut args = None;
    let mut kwargs = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidRequest(format!("malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let slot = match name.as_str() {
            CODE_PART => &mut code,
            ARGS_PART => &mut args,
            KWARGS_PART => &mut kwargs,
            other => return Err(Error::InvalidRequest(format!("unexpected part '{}'", other))),
        };
        if slot.is_some() {
            return Err(Error::InvalidRequest(format!("duplicate part '{}'", name)));
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| Error::InvalidRequest(format!("failed to read part '{}': {}", name, e)))?;
        *slot = Some(bytes.to_vec());
    }

    let missing = |part: &str| Error::InvalidRequest(format!("missing part '{}'", part));
    Ok(DispatchEnvelope {
        code: code.ok_or_else(|| missing(CODE_PART))?,
        args: args.ok_or_else(|| missing(ARGS_PART))?,
        kwargs: kwargs.ok_or_else(|| missing(KWARGS_PART))?,
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// GET /health - execution service readiness.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::SanityCheckKind;
    use crate::executor::TaskCatalog;

    const BOUNDARY: &str = "taskgate-test-boundary";

    fn app() -> Router {
        router(Arc::new(RemoteExecutor::from_kind(
            Arc::new(TaskCatalog::builtin()),
            SanityCheckKind::Catalog,
        )))
    }

    fn multipart_body(parts: &[(&str, &str)]) -> String {
        let mut body = String::new();
        for (name, content) in parts {
            body.push_str(&format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, content
            ));
        }
        body.push_str(&format!("--{}--\r\n", BOUNDARY));
        body
    }

    async fn post(parts: &[(&str, &str)]) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_execute_square() {
        let (status, body) = post(&[
            ("code", r#"{"name":"square"}"#),
            ("args", "[7]"),
            ("kwargs", "{}"),
        ])
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "passed_check");
        assert_eq!(body["output"], json!(49));
    }

    #[tokio::test]
    async fn test_execute_failed_check() {
        let (status, body) = post(&[
            ("code", r#"{"name":"not_registered"}"#),
            ("args", "[]"),
            ("kwargs", "{}"),
        ])
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "failed_check");
        assert_eq!(body["output"], Value::Null);
    }

    #[tokio::test]
    async fn test_missing_part_is_rejected() {
        let (status, body) = post(&[("code", r#"{"name":"square"}"#), ("args", "[7]")]).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "invalid_request");
    }

    #[tokio::test]
    async fn test_unexpected_part_is_rejected() {
        let (status, _) = post(&[
            ("code", r#"{"name":"square"}"#),
            ("args", "[7]"),
            ("kwargs", "{}"),
            ("extra", "1"),
        ])
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_undecodable_blob_is_rejected() {
        let (status, body) = post(&[
            ("code", r#"{"name":"square"}"#),
            ("args", "seven"),
            ("kwargs", "{}"),
        ])
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "invalid_envelope");
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
