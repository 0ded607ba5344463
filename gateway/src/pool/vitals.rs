//! Vitals collection across the worker pool.
//!
//! One heartbeat probe per worker, all in flight at once, each bounded by
//! its own timeout. A failed probe marks that worker unreachable and never
//! aborts the round.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use reqwest::Client;
use serde::Serialize;
use taskgate_common::{HeartbeatReport, WorkerAddress};
use thiserror::Error;

use super::WorkerNode;

/// Why a single heartbeat probe failed. Recovered inside the collector.
#[derive(Debug, Error)]
pub enum ProbeFailure {
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("malformed heartbeat: {0}")]
    Malformed(String),
}

/// Liveness and load of one worker, as seen in one round.
///
/// Unreachable entries carry no vitals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VitalsSnapshot {
    pub node: WorkerNode,
    pub cpu_load: Option<f64>,
    pub memory_used_pct: Option<f64>,
    pub reachable: bool,
    pub observed_at: DateTime<Utc>,
}

impl VitalsSnapshot {
    /// A worker that answered its heartbeat.
    pub fn online(node: WorkerNode, cpu_load: f64, memory_used_pct: f64) -> Self {
        Self {
            node,
            cpu_load: Some(clamp_percent(cpu_load)),
            memory_used_pct: Some(clamp_percent(memory_used_pct)),
            reachable: true,
            observed_at: Utc::now(),
        }
    }

    /// A worker whose heartbeat failed.
    pub fn offline(node: WorkerNode) -> Self {
        Self {
            node,
            cpu_load: None,
            memory_used_pct: None,
            reachable: false,
            observed_at: Utc::now(),
        }
    }
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Vitals of the whole pool from a single collection round, in registry order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolSnapshot {
    entries: Vec<VitalsSnapshot>,
}

impl PoolSnapshot {
    pub fn new(entries: Vec<VitalsSnapshot>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[VitalsSnapshot] {
        &self.entries
    }

    /// Reachable entries, in round order.
    pub fn reachable(&self) -> impl Iterator<Item = &VitalsSnapshot> {
        self.entries.iter().filter(|e| e.reachable)
    }

    pub fn get(&self, node: &WorkerNode) -> Option<&VitalsSnapshot> {
        self.entries.iter().find(|e| &e.node == node)
    }

    pub fn reachable_count(&self) -> usize {
        self.reachable().count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Probes worker heartbeat endpoints.
#[derive(Debug, Clone, Default)]
pub struct VitalsCollector {
    http_client: Client,
}

impl VitalsCollector {
    pub fn new() -> Self {
        Self {
            http_client: Client::new(),
        }
    }

    pub fn with_client(http_client: Client) -> Self {
        Self { http_client }
    }

    /// Probe every node concurrently and return once all probes settle.
    pub async fn collect(&self, nodes: &[WorkerNode], timeout: Duration) -> PoolSnapshot {
        let started = Instant::now();

        let probes = nodes.iter().map(|node| async move {
            match self.probe(&node.heartbeat, timeout).await {
                Ok(report) => VitalsSnapshot::online(node.clone(), report.cpu, report.memory),
                Err(failure) => {
                    tracing::debug!(
                        worker = %node.heartbeat,
                        error = %failure,
                        "Heartbeat probe failed"
                    );
                    VitalsSnapshot::offline(node.clone())
                }
            }
        });
        let snapshot = PoolSnapshot::new(join_all(probes).await);

        tracing::debug!(
            workers = snapshot.len(),
            reachable = snapshot.reachable_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Vitals collected"
        );

        snapshot
    }

    /// One heartbeat request, bounded by `timeout`.
    pub async fn probe(
        &self,
        address: &WorkerAddress,
        timeout: Duration,
    ) -> Result<HeartbeatReport, ProbeFailure> {
        let request = async {
            let response = self
                .http_client
                .get(address.url())
                .timeout(timeout)
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        ProbeFailure::Timeout(timeout)
                    } else {
                        ProbeFailure::Connection(e.to_string())
                    }
                })?;

            if !response.status().is_success() {
                return Err(ProbeFailure::Status(response.status().as_u16()));
            }

            response
                .json::<HeartbeatReport>()
                .await
                .map_err(|e| ProbeFailure::Malformed(e.to_string()))
        };

        tokio::time::timeout(timeout, request)
            .await
            .map_err(|_| ProbeFailure::Timeout(timeout))?
    }
}
