//! Worker registry: the static pool a gateway may dispatch to.
//!
//! Only addresses live here. Liveness is always a fresh heartbeat round,
//! never registry state.

use serde::{Deserialize, Serialize};
use taskgate_common::WorkerAddress;
use tokio::sync::RwLock;

/// A worker's two endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkerNode {
    /// Heartbeat endpoint (host vitals).
    pub heartbeat: WorkerAddress,
    /// Execution endpoint (task dispatch).
    pub execution: WorkerAddress,
}

impl WorkerNode {
    pub fn new(heartbeat: WorkerAddress, execution: WorkerAddress) -> Self {
        Self { heartbeat, execution }
    }
}

impl std::fmt::Display for WorkerNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (exec {})", self.heartbeat, self.execution)
    }
}

/// Registry of worker nodes, in insertion order.
#[derive(Debug, Default)]
pub struct WorkerRegistry {
    nodes: RwLock<Vec<WorkerNode>>,
}

impl WorkerRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            nodes: RwLock::new(Vec::new()),
        }
    }

    /// Registry seeded with `nodes`; duplicates are dropped.
    pub fn from_nodes(nodes: impl IntoIterator<Item = WorkerNode>) -> Self {
        let mut unique: Vec<WorkerNode> = Vec::new();
        for node in nodes {
            if !unique.contains(&node) {
                unique.push(node);
            }
        }
        Self {
            nodes: RwLock::new(unique),
        }
    }

    /// Add a node. Returns `false` if it was already registered.
    pub async fn add(&self, node: WorkerNode) -> bool {
        let mut nodes = self.nodes.write().await;
        if nodes.contains(&node) {
            return false;
        }
        tracing::info!(worker = %node, "Worker added to pool");
        nodes.push(node);
        true
    }

    /// Remove a node. Returns `false` if it was not registered.
    pub async fn remove(&self, node: &WorkerNode) -> bool {
        let mut nodes = self.nodes.write().await;
        let before = nodes.len();
        nodes.retain(|n| n != node);
        let removed = nodes.len() != before;
        if removed {
            tracing::info!(worker = %node, "Worker removed from pool");
        }
        removed
    }

    /// All nodes in insertion order.
    pub async fn list(&self) -> Vec<WorkerNode> {
        self.nodes.read().await.clone()
    }

    pub async fn contains(&self, node: &WorkerNode) -> bool {
        self.nodes.read().await.contains(node)
    }

    pub async fn len(&self) -> usize {
        self.nodes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.nodes.read().await.is_empty()
    }
}
