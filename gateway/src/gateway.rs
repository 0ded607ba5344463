//! The gateway: snapshot the pool, pick a worker, dispatch the bound task.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;
use taskgate_common::{
    DispatchEnvelope, ExecutionResult, Kwargs, Task, ARGS_PART, CODE_PART, KWARGS_PART,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::allocation::AllocationStrategy;
use crate::error::{DispatchError, GatewayError};
use crate::pool::{PoolSnapshot, VitalsCollector, WorkerNode, WorkerRegistry};

/// Header carrying the per-dispatch correlation id.
pub const DISPATCH_ID_HEADER: &str = "x-dispatch-id";

/// Timeouts applied by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewaySettings {
    /// Bound on each heartbeat probe.
    pub probe_timeout: Duration,
    /// Bound on a task dispatch, including the worker's execution time.
    pub dispatch_timeout: Duration,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_millis(1000),
            dispatch_timeout: Duration::from_secs(300),
        }
    }
}

/// Dispatches calls of one bound task to workers chosen by a strategy.
pub struct Gateway {
    task: RwLock<Task>,
    strategy: AllocationStrategy,
    registry: Arc<WorkerRegistry>,
    collector: VitalsCollector,
    http_client: Client,
    settings: GatewaySettings,
}

impl Gateway {
    pub fn new(
        task: Task,
        strategy: AllocationStrategy,
        registry: Arc<WorkerRegistry>,
        settings: GatewaySettings,
    ) -> Self {
        let http_client = Client::new();
        Self {
            task: RwLock::new(task),
            strategy,
            registry,
            collector: VitalsCollector::with_client(http_client.clone()),
            http_client,
            settings,
        }
    }

    /// Run the bound task once on a worker chosen from a fresh snapshot.
    ///
    /// `call_args` replaces the setup positionals when present; `call_kwargs`
    /// override setup kwargs key by key. `criteria` only matters for
    /// fair-share allocation.
    pub async fn execute(
        &self,
        call_args: Option<Vec<Value>>,
        call_kwargs: Kwargs,
        criteria: &str,
    ) -> Result<ExecutionResult, GatewayError> {
        let snapshot = self.pool_snapshot().await;
        let node = self.strategy.select(&snapshot, criteria)?;

        let task = self.task().await;
        let (args, kwargs) = task.merge(call_args, call_kwargs);
        let envelope = DispatchEnvelope::seal(&task.callable, &args, &kwargs)?;

        let result = self.dispatch(&node, task.name(), envelope).await?;
        Ok(result)
    }

    /// Replace the task bound to this gateway.
    pub async fn set_task(&self, task: Task) {
        tracing::info!(task = %task.name(), "Bound task replaced");
        *self.task.write().await = task;
    }

    pub async fn task(&self) -> Task {
        self.task.read().await.clone()
    }

    pub fn registry(&self) -> &Arc<WorkerRegistry> {
        &self.registry
    }

    pub fn strategy(&self) -> &AllocationStrategy {
        &self.strategy
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    /// One vitals round over the current registry.
    pub async fn pool_snapshot(&self) -> PoolSnapshot {
        let nodes = self.registry.list().await;
        if nodes.is_empty() {
            return PoolSnapshot::new(Vec::new());
        }
        self.collector.collect(&nodes, self.settings.probe_timeout).await
    }

    async fn dispatch(
        &self,
        node: &WorkerNode,
        task_name: &str,
        envelope: DispatchEnvelope,
    ) -> Result<ExecutionResult, DispatchError> {
        let url = node.execution.url();
        let dispatch_id = Uuid::new_v4();
        let timeout = self.settings.dispatch_timeout;
        let start = Instant::now();

        tracing::debug!(
            dispatch_id = %dispatch_id,
            worker = %node.execution,
            task = %task_name,
            bytes = envelope.len(),
            "Dispatching task"
        );

        let form = Form::new()
            .part(CODE_PART, Part::bytes(envelope.code))
            .part(ARGS_PART, Part::bytes(envelope.args))
            .part(KWARGS_PART, Part::bytes(envelope.kwargs));

        let transport_error = |e: reqwest::Error| {
            if e.is_timeout() {
                DispatchError::Timeout {
                    url: url.clone(),
                    timeout_ms: timeout.as_millis() as u64,
                }
            } else {
                DispatchError::Connection {
                    url: url.clone(),
                    reason: e.to_string(),
                }
            }
        };

        let response = self
            .http_client
            .post(&url)
            .header(DISPATCH_ID_HEADER, dispatch_id.to_string())
            .timeout(timeout)
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                dispatch_id = %dispatch_id,
                worker = %node.execution,
                status = %status,
                "Worker rejected dispatch"
            );
            return Err(DispatchError::Status {
                url: url.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await.map_err(transport_error)?;
        let result: ExecutionResult =
            serde_json::from_slice(&body).map_err(|e| DispatchError::Decode {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        tracing::info!(
            dispatch_id = %dispatch_id,
            worker = %node.execution,
            task = %task_name,
            status = %result.status,
            duration_ms = start.elapsed().as_millis() as u64,
            "Task dispatched"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn gateway(task: Task) -> Gateway {
        Gateway::new(
            task,
            AllocationStrategy::fcfs(),
            Arc::new(WorkerRegistry::new()),
            GatewaySettings::default(),
        )
    }

    #[test]
    fn test_default_settings() {
        let settings = GatewaySettings::default();
        assert_eq!(settings.probe_timeout, Duration::from_secs(1));
        assert_eq!(settings.dispatch_timeout, Duration::from_secs(300));
    }

    #[tokio::test]
    async fn test_set_task_replaces_binding() {
        let gateway = gateway(Task::new("identity"));
        assert_eq!(gateway.task().await.name(), "identity");

        gateway.set_task(Task::new("square").with_args(vec![json!(3)])).await;
        let task = gateway.task().await;
        assert_eq!(task.name(), "square");
        assert_eq!(task.args, vec![json!(3)]);
    }

    #[tokio::test]
    async fn test_empty_registry_has_no_candidates() {
        let gateway = gateway(Task::new("identity"));
        let err = gateway.execute(None, Kwargs::new(), "cpu").await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Allocation(crate::allocation::AllocationError::NoCandidates)
        ));
    }

    #[tokio::test]
    async fn test_empty_registry_snapshot() {
        let gateway = gateway(Task::new("identity"));
        assert!(gateway.pool_snapshot().await.is_empty());
        assert_eq!(gateway.strategy().name(), "fcfs");
    }
}
