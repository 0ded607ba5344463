//! Worker allocation strategies.

pub mod fair_share;
pub mod fcfs;
pub mod queue;
pub mod round_robin;

use std::collections::VecDeque;
use std::str::FromStr;

use thiserror::Error;

pub use fair_share::{Criteria, FairShare};
pub use fcfs::Fcfs;
pub use queue::AllocationQueue;
pub use round_robin::RoundRobin;

use crate::pool::{PoolSnapshot, WorkerNode};

/// Errors from worker selection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    #[error("No reachable workers to allocate")]
    NoCandidates,
    #[error("Unknown allocation criteria '{0}' (expected cpu or memory)")]
    UnknownCriteria(String),
    #[error("Unknown allocation strategy '{0}' (expected fcfs, round_robin or fair_share)")]
    UnknownStrategy(String),
}

/// Strategy for picking the worker a call is dispatched to.
#[derive(Debug)]
pub enum AllocationStrategy {
    /// Longest-waiting reachable worker.
    Fcfs(Fcfs),
    /// Rotate through reachable workers.
    RoundRobin(RoundRobin),
    /// Least loaded on the requested criteria.
    FairShare(FairShare),
}

impl Default for AllocationStrategy {
    fn default() -> Self {
        AllocationStrategy::Fcfs(Fcfs::new())
    }
}

impl AllocationStrategy {
    pub fn fcfs() -> Self {
        AllocationStrategy::Fcfs(Fcfs::new())
    }

    pub fn round_robin() -> Self {
        AllocationStrategy::RoundRobin(RoundRobin::new())
    }

    pub fn fair_share() -> Self {
        AllocationStrategy::FairShare(FairShare::new())
    }

    /// Build a fresh strategy from its configured name.
    pub fn from_name(name: &str) -> Result<Self, AllocationError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "fcfs" => Ok(Self::fcfs()),
            "round_robin" | "roundrobin" | "rr" => Ok(Self::round_robin()),
            "fair_share" | "fairshare" | "fair" => Ok(Self::fair_share()),
            _ => Err(AllocationError::UnknownStrategy(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AllocationStrategy::Fcfs(_) => "fcfs",
            AllocationStrategy::RoundRobin(_) => "round_robin",
            AllocationStrategy::FairShare(_) => "fair_share",
        }
    }

    /// Choose a worker from `snapshot`. Only fair-share reads `criteria`.
    pub fn select(
        &self,
        snapshot: &PoolSnapshot,
        criteria: &str,
    ) -> Result<WorkerNode, AllocationError> {
        match self {
            AllocationStrategy::Fcfs(fcfs) => fcfs.select(snapshot),
            AllocationStrategy::RoundRobin(rr) => rr.select(snapshot),
            AllocationStrategy::FairShare(fair) => fair.select(snapshot, criteria),
        }
    }
}

impl FromStr for AllocationStrategy {
    type Err = AllocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

/// Bring a candidate silo in line with `snapshot`: drop workers that are not
/// reachable in it, then append newly reachable ones in snapshot order.
pub(crate) fn sync_candidates(silo: &mut VecDeque<WorkerNode>, snapshot: &PoolSnapshot) {
    silo.retain(|node| snapshot.reachable().any(|vitals| &vitals.node == node));
    for vitals in snapshot.reachable() {
        if !silo.contains(&vitals.node) {
            silo.push_back(vitals.node.clone());
        }
    }
}
