//! First-come-first-served allocation.

use super::queue::AllocationQueue;
use super::{sync_candidates, AllocationError};
use crate::pool::{PoolSnapshot, WorkerNode};

const ARRIVALS: usize = 0;

/// Hands out the longest-waiting reachable worker.
///
/// Workers join the queue in snapshot order as they are first seen
/// reachable and leave it when a snapshot shows them unreachable. `select`
/// keeps returning the head until it is removed with [`Fcfs::pop`].
#[derive(Debug, Default)]
pub struct Fcfs {
    queue: AllocationQueue<WorkerNode>,
}

impl Fcfs {
    pub fn new() -> Self {
        Self {
            queue: AllocationQueue::with_silos(1),
        }
    }

    pub fn select(&self, snapshot: &PoolSnapshot) -> Result<WorkerNode, AllocationError> {
        self.queue
            .update(ARRIVALS, |silo| {
                sync_candidates(silo, snapshot);
                silo.front().cloned()
            })
            .flatten()
            .ok_or(AllocationError::NoCandidates)
    }

    /// Remove the head of the queue.
    pub fn pop(&self) -> Result<WorkerNode, AllocationError> {
        self.queue.pop(ARRIVALS).ok_or(AllocationError::NoCandidates)
    }

    pub fn queue(&self) -> &AllocationQueue<WorkerNode> {
        &self.queue
    }
}
