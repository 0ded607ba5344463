//! Round-robin allocation over the reachable workers.

use super::queue::AllocationQueue;
use super::{sync_candidates, AllocationError};
use crate::pool::{PoolSnapshot, WorkerNode};

const ROTATION: usize = 0;

/// Rotates through reachable workers in the order they were first seen.
///
/// The head of the rotation is the next worker to hand out. New workers join
/// at the back; unreachable ones drop out until they come back.
#[derive(Debug, Default)]
pub struct RoundRobin {
    rotation: AllocationQueue<WorkerNode>,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self {
            rotation: AllocationQueue::with_silos(1),
        }
    }

    pub fn select(&self, snapshot: &PoolSnapshot) -> Result<WorkerNode, AllocationError> {
        self.rotation
            .update(ROTATION, |silo| {
                sync_candidates(silo, snapshot);
                let next = silo.pop_front()?;
                silo.push_back(next.clone());
                Some(next)
            })
            .flatten()
            .ok_or(AllocationError::NoCandidates)
    }

    pub fn rotation(&self) -> &AllocationQueue<WorkerNode> {
        &self.rotation
    }
}
