//! Least-loaded allocation.

use std::fmt;
use std::str::FromStr;

use super::AllocationError;
use crate::pool::{PoolSnapshot, VitalsSnapshot, WorkerNode};

/// Which vital a fair-share selection minimizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criteria {
    Cpu,
    Memory,
}

impl Criteria {
    pub fn as_str(&self) -> &'static str {
        match self {
            Criteria::Cpu => "cpu",
            Criteria::Memory => "memory",
        }
    }

    fn load(&self, vitals: &VitalsSnapshot) -> Option<f64> {
        match self {
            Criteria::Cpu => vitals.cpu_load,
            Criteria::Memory => vitals.memory_used_pct,
        }
    }
}

impl FromStr for Criteria {
    type Err = AllocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(Criteria::Cpu),
            "memory" | "mem" => Ok(Criteria::Memory),
            _ => Err(AllocationError::UnknownCriteria(s.to_string())),
        }
    }
}

impl fmt::Display for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Picks the reachable worker with the lowest load on the requested vital.
/// Ties go to the lowest [`WorkerNode`].
#[derive(Debug, Default)]
pub struct FairShare;

impl FairShare {
    pub fn new() -> Self {
        Self
    }

    pub fn select(
        &self,
        snapshot: &PoolSnapshot,
        criteria: &str,
    ) -> Result<WorkerNode, AllocationError> {
        let criteria: Criteria = criteria.parse()?;

        snapshot
            .reachable()
            .filter_map(|vitals| criteria.load(vitals).map(|load| (load, &vitals.node)))
            .min_by(|(a_load, a_node), (b_load, b_node)| {
                a_load.total_cmp(b_load).then_with(|| a_node.cmp(b_node))
            })
            .map(|(_, node)| node.clone())
            .ok_or(AllocationError::NoCandidates)
    }
}
