//! HTTP protocol types for gateway-worker communication.
//!
//! # Protocol Overview
//!
//! Each worker exposes two independent listeners:
//!
//! - **Heartbeat** (`GET /`): returns a [`HeartbeatReport`] with the host's
//!   current load. Any non-200 answer or a connection error means the worker
//!   is unreachable for this round.
//! - **Execution** (`POST /`): accepts a multipart body with exactly three
//!   parts (`code`, `args`, `kwargs`) and answers with an [`ExecutionResult`].
//!
//! Keeping them separate lets the gateway tell "host down" apart from
//! "execution service down".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of a heartbeat response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatReport {
    /// The worker's own address (`protocol://host:port`).
    pub location: String,
    /// CPU load percentage.
    pub cpu: f64,
    /// Memory used percentage.
    pub memory: f64,
    /// The caller's address as observed by the worker.
    pub message: String,
    /// Worker name.
    #[serde(default)]
    pub node: Option<String>,
    /// When the sample was taken.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Outcome of the worker's sanity gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// The gate passed and the callable was invoked.
    #[serde(rename = "passed_check")]
    PassedCheck,
    /// The gate rejected the task; nothing ran.
    #[serde(rename = "failed_check", alias = "Sanity check not passed.")]
    FailedCheck,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::PassedCheck => "passed_check",
            ExecutionStatus::FailedCheck => "failed_check",
        }
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a remote execution.
///
/// A callable that fails on the worker is reported through `error`; it is
/// data, not a transport failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    #[serde(rename = "message", alias = "status")]
    pub status: ExecutionStatus,
    #[serde(default)]
    pub output: Value,
    #[serde(default)]
    pub error: Option<String>,
    /// Wall-clock time spent in the callable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
}

impl ExecutionResult {
    /// Callable ran and returned a value.
    pub fn passed(output: Value, execution_time_ms: u64) -> Self {
        Self {
            status: ExecutionStatus::PassedCheck,
            output,
            error: None,
            execution_time_ms: Some(execution_time_ms),
        }
    }

    /// Callable ran and failed.
    pub fn faulted(error: impl Into<String>, execution_time_ms: u64) -> Self {
        Self {
            status: ExecutionStatus::PassedCheck,
            output: Value::Null,
            error: Some(error.into()),
            execution_time_ms: Some(execution_time_ms),
        }
    }

    /// Sanity gate rejected the task.
    pub fn failed_check() -> Self {
        Self {
            status: ExecutionStatus::FailedCheck,
            output: Value::Null,
            error: None,
            execution_time_ms: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::PassedCheck && self.error.is_none()
    }
}
