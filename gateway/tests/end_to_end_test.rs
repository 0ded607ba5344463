//! Gateway driving real worker listeners over loopback.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use taskgate_common::{ExecutionStatus, Kwargs, Task, WorkerAddress};
use taskgate_gateway::{
    routes, AllocationStrategy, AppState, Gateway, GatewaySettings, WorkerNode, WorkerRegistry,
};
use taskgate_worker::config::SanityCheckKind;
use taskgate_worker::heartbeat::FixedVitals;
use taskgate_worker::{executor, heartbeat, HeartbeatState, HostVitals, RemoteExecutor, TaskCatalog};
use tokio::net::TcpListener;
use tower::ServiceExt;

/// Start a worker's heartbeat and execution listeners on ephemeral ports.
async fn start_worker(name: &str, cpu: f64) -> WorkerNode {
    let heartbeat_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let heartbeat_port = heartbeat_listener.local_addr().unwrap().port();
    let heartbeat_address = WorkerAddress::http("127.0.0.1", heartbeat_port);
    let state = Arc::new(HeartbeatState::new(
        heartbeat_address.clone(),
        name,
        Arc::new(FixedVitals(HostVitals::new(cpu, 30.0))),
    ));
    tokio::spawn(heartbeat::serve(heartbeat_listener, state));

    let executor_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let executor_port = executor_listener.local_addr().unwrap().port();
    let remote_executor = Arc::new(RemoteExecutor::from_kind(
        Arc::new(TaskCatalog::builtin()),
        SanityCheckKind::Catalog,
    ));
    tokio::spawn(executor::serve(executor_listener, remote_executor));

    WorkerNode::new(heartbeat_address, WorkerAddress::http("127.0.0.1", executor_port))
}

fn settings() -> GatewaySettings {
    GatewaySettings {
        probe_timeout: Duration::from_millis(500),
        dispatch_timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn test_square_on_single_worker() {
    let node = start_worker("solo", 10.0).await;
    let gateway = Gateway::new(
        Task::new("square"),
        AllocationStrategy::fcfs(),
        Arc::new(WorkerRegistry::from_nodes(vec![node])),
        settings(),
    );

    let result = gateway.execute(Some(vec![json!(7)]), Kwargs::new(), "cpu").await.unwrap();

    assert_eq!(result.status, ExecutionStatus::PassedCheck);
    assert_eq!(result.output, json!(49));
    assert!(result.error.is_none());
}

#[tokio::test]
async fn test_pool_snapshot_sees_worker_vitals() {
    let node = start_worker("observed", 42.0).await;
    let gateway = Gateway::new(
        Task::new("identity"),
        AllocationStrategy::fcfs(),
        Arc::new(WorkerRegistry::from_nodes(vec![node.clone()])),
        settings(),
    );

    let snapshot = gateway.pool_snapshot().await;
    let vitals = snapshot.get(&node).unwrap();
    assert!(vitals.reachable);
    assert_eq!(vitals.cpu_load, Some(42.0));
    assert_eq!(vitals.memory_used_pct, Some(30.0));
}

#[tokio::test]
async fn test_task_fault_travels_back_as_result() {
    let node = start_worker("faulty", 10.0).await;
    let gateway = Gateway::new(
        Task::new("square"),
        AllocationStrategy::fcfs(),
        Arc::new(WorkerRegistry::from_nodes(vec![node])),
        settings(),
    );

    let result = gateway
        .execute(Some(vec![json!("seven")]), Kwargs::new(), "cpu")
        .await
        .unwrap();

    assert_eq!(result.status, ExecutionStatus::PassedCheck);
    assert!(result.error.is_some());
}

#[tokio::test]
async fn test_unregistered_callable_fails_check() {
    let node = start_worker("strict", 10.0).await;
    let gateway = Gateway::new(
        Task::new("rm_rf"),
        AllocationStrategy::fcfs(),
        Arc::new(WorkerRegistry::from_nodes(vec![node])),
        settings(),
    );

    let result = gateway.execute(None, Kwargs::new(), "cpu").await.unwrap();
    assert_eq!(result.status, ExecutionStatus::FailedCheck);
    assert_eq!(result.output, Value::Null);
}

#[tokio::test]
async fn test_fair_share_picks_idle_worker() {
    let busy = start_worker("busy", 80.0).await;
    let idle = start_worker("idle", 20.0).await;
    let middling = start_worker("middling", 50.0).await;
    let gateway = Gateway::new(
        Task::new("identity"),
        AllocationStrategy::fair_share(),
        Arc::new(WorkerRegistry::from_nodes(vec![busy, idle.clone(), middling])),
        settings(),
    );

    let snapshot = gateway.pool_snapshot().await;
    let selected = gateway.strategy().select(&snapshot, "cpu").unwrap();
    assert_eq!(selected, idle);
}

#[tokio::test]
async fn test_http_front_executes_and_rebinds() {
    let node = start_worker("front", 10.0).await;
    let gateway = Arc::new(Gateway::new(
        Task::new("identity"),
        AllocationStrategy::fcfs(),
        Arc::new(WorkerRegistry::from_nodes(vec![node])),
        settings(),
    ));
    let app = routes::app(Arc::new(AppState {
        gateway,
        default_criteria: "cpu".to_string(),
    }));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/task")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"callable":{"name":"add"}}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/execute")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"args":[2,3]}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["message"], "passed_check");
    assert_eq!(body["output"], json!(5));
}
