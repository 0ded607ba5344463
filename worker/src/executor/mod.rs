//! Remote task execution.
//!
//! The executor opens a dispatch envelope, runs the sanity gate, and invokes
//! the named task from the catalog on a blocking thread. Anything that goes
//! wrong inside the task (a fault or a panic) is reported in the result; the
//! listener keeps serving.

mod api;
mod catalog;
mod sanity;

pub use api::{router, serve};
pub use catalog::{TaskCatalog, TaskFault, TaskFn};
pub use sanity::{AllowAll, CatalogMembership, SanityCheck};

use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use taskgate_common::{DispatchEnvelope, ExecutionResult, OpenedEnvelope};

use crate::config::SanityCheckKind;
use crate::error::Result;

/// Runs dispatched tasks against a task catalog.
pub struct RemoteExecutor {
    catalog: Arc<TaskCatalog>,
    sanity_check: Arc<dyn SanityCheck>,
}

impl RemoteExecutor {
    pub fn new(catalog: Arc<TaskCatalog>, sanity_check: Arc<dyn SanityCheck>) -> Self {
        Self {
            catalog,
            sanity_check,
        }
    }

    /// Executor with the sanity gate selected by configuration.
    pub fn from_kind(catalog: Arc<TaskCatalog>, kind: SanityCheckKind) -> Self {
        let sanity_check: Arc<dyn SanityCheck> = match kind {
            SanityCheckKind::Catalog => Arc::new(CatalogMembership::new(catalog.clone())),
            SanityCheckKind::AllowAll => Arc::new(AllowAll),
        };
        Self::new(catalog, sanity_check)
    }

    pub fn catalog(&self) -> &Arc<TaskCatalog> {
        &self.catalog
    }

    /// Handle one dispatch.
    ///
    /// Only an undecodable envelope is an error; every other outcome is an
    /// [`ExecutionResult`].
    pub async fn handle(&self, envelope: &DispatchEnvelope) -> Result<ExecutionResult> {
        let OpenedEnvelope {
            callable,
            args,
            kwargs,
        } = envelope.open()?;

        if !self.sanity_check.check(&callable, &args, &kwargs).await {
            tracing::warn!(
                task = %callable.name,
                gate = self.sanity_check.name(),
                "Sanity check not passed"
            );
            return Ok(ExecutionResult::failed_check());
        }

        let Some(task) = self.catalog.get(&callable.name).await else {
            tracing::warn!(task = %callable.name, "Task not found in catalog");
            return Ok(ExecutionResult::faulted(
                format!("unknown task '{}'", callable.name),
                0,
            ));
        };

        let started = Instant::now();
        let outcome = tokio::task::spawn_blocking(move || task(&args, &kwargs)).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let result = match outcome {
            Ok(Ok(output)) => ExecutionResult::passed(output, elapsed_ms),
            Ok(Err(fault)) => ExecutionResult::faulted(fault.to_string(), elapsed_ms),
            Err(join_error) if join_error.is_panic() => ExecutionResult::faulted(
                format!("task panicked: {}", panic_message(join_error.into_panic())),
                elapsed_ms,
            ),
            Err(join_error) => {
                ExecutionResult::faulted(format!("task aborted: {}", join_error), elapsed_ms)
            }
        };

        match &result.error {
            None => tracing::info!(task = %callable.name, elapsed_ms, "Task executed"),
            Some(error) => {
                tracing::warn!(task = %callable.name, elapsed_ms, error = %error, "Task failed")
            }
        }

        Ok(result)
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use taskgate_common::{CallableRef, ExecutionStatus, Kwargs};

    use crate::error::Error;

    fn envelope(name: &str, args: Vec<Value>) -> DispatchEnvelope {
        DispatchEnvelope::seal(&CallableRef::new(name), &args, &Kwargs::new()).unwrap()
    }

    fn builtin_executor(kind: SanityCheckKind) -> RemoteExecutor {
        RemoteExecutor::from_kind(Arc::new(TaskCatalog::builtin()), kind)
    }

    #[tokio::test]
    async fn test_square_passes() {
        let executor = builtin_executor(SanityCheckKind::Catalog);
        let result = executor.handle(&envelope("square", vec![json!(7)])).await.unwrap();

        assert_eq!(result.status, ExecutionStatus::PassedCheck);
        assert_eq!(result.output, json!(49));
        assert!(result.error.is_none());
        assert!(result.execution_time_ms.is_some());
    }

    #[tokio::test]
    async fn test_unregistered_task_fails_check() {
        let executor = builtin_executor(SanityCheckKind::Catalog);
        let result = executor.handle(&envelope("shutdown", vec![])).await.unwrap();

        assert_eq!(result, ExecutionResult::failed_check());
    }

    #[tokio::test]
    async fn test_unregistered_task_with_allow_all_is_a_fault() {
        let executor = builtin_executor(SanityCheckKind::AllowAll);
        let result = executor.handle(&envelope("shutdown", vec![])).await.unwrap();

        assert_eq!(result.status, ExecutionStatus::PassedCheck);
        assert_eq!(result.output, Value::Null);
        assert!(result.error.unwrap().contains("unknown task"));
    }

    #[tokio::test]
    async fn test_task_fault_is_captured() {
        let executor = builtin_executor(SanityCheckKind::Catalog);
        let result = executor.handle(&envelope("square", vec![json!("x")])).await.unwrap();

        assert_eq!(result.status, ExecutionStatus::PassedCheck);
        assert!(result.error.unwrap().contains("must be a number"));
    }

    #[tokio::test]
    async fn test_panic_is_captured_and_executor_survives() {
        let catalog = Arc::new(TaskCatalog::builtin());
        catalog
            .register("explode", |_: &[Value], _: &Kwargs| panic!("boom"))
            .await;
        let executor = RemoteExecutor::from_kind(catalog, SanityCheckKind::Catalog);

        let result = executor.handle(&envelope("explode", vec![])).await.unwrap();
        assert_eq!(result.error.as_deref(), Some("task panicked: boom"));

        let result = executor.handle(&envelope("square", vec![json!(3)])).await.unwrap();
        assert_eq!(result.output, json!(9));
    }

    #[tokio::test]
    async fn test_bad_envelope_is_an_error() {
        let executor = builtin_executor(SanityCheckKind::Catalog);
        let bad = DispatchEnvelope {
            code: b"{".to_vec(),
            args: b"[]".to_vec(),
            kwargs: b"{}".to_vec(),
        };

        assert!(matches!(executor.handle(&bad).await, Err(Error::InvalidEnvelope(_))));
    }
}
