//! Periodic pool observation.
//!
//! Runs heartbeat rounds on a fixed interval and logs what it sees. Its
//! snapshots are never used for allocation; every `execute` takes its own.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use super::{PoolSnapshot, VitalsCollector, WorkerRegistry};

pub struct PoolMonitor {
    registry: Arc<WorkerRegistry>,
    collector: VitalsCollector,
    every: Duration,
    probe_timeout: Duration,
}

impl PoolMonitor {
    pub fn new(
        registry: Arc<WorkerRegistry>,
        collector: VitalsCollector,
        every: Duration,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            collector,
            every,
            probe_timeout,
        }
    }

    /// One observation round.
    pub async fn round(&self) -> PoolSnapshot {
        let nodes = self.registry.list().await;
        let snapshot = self.collector.collect(&nodes, self.probe_timeout).await;

        let unreachable: Vec<String> = snapshot
            .entries()
            .iter()
            .filter(|e| !e.reachable)
            .map(|e| e.node.heartbeat.to_string())
            .collect();

        if unreachable.is_empty() {
            tracing::info!(workers = snapshot.len(), "Pool healthy");
        } else {
            tracing::warn!(
                workers = snapshot.len(),
                reachable = snapshot.reachable_count(),
                unreachable = %unreachable.join(", "),
                "Pool has unreachable workers"
            );
        }

        snapshot
    }

    /// Run rounds forever.
    pub async fn run(self) {
        let mut ticker = interval(self.every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.round().await;
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tracing::info!(interval_secs = self.every.as_secs(), "Pool monitor started");
        tokio::spawn(self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::WorkerNode;
    use taskgate_common::WorkerAddress;

    #[tokio::test]
    async fn test_round_on_empty_registry() {
        let monitor = PoolMonitor::new(
            Arc::new(WorkerRegistry::new()),
            VitalsCollector::new(),
            Duration::from_secs(1),
            Duration::from_millis(50),
        );
        assert!(monitor.round().await.is_empty());
    }

    #[tokio::test]
    async fn test_round_reports_dead_worker() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let node = WorkerNode::new(
            WorkerAddress::http("127.0.0.1", port),
            WorkerAddress::http("127.0.0.1", port),
        );
        let monitor = PoolMonitor::new(
            Arc::new(WorkerRegistry::from_nodes(vec![node])),
            VitalsCollector::new(),
            Duration::from_secs(1),
            Duration::from_millis(200),
        );

        let snapshot = monitor.round().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.reachable_count(), 0);
    }
}
