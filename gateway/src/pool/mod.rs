//! Worker pool: registry, vitals collection and monitoring.

pub mod monitor;
pub mod registry;
pub mod vitals;

pub use monitor::PoolMonitor;
pub use registry::{WorkerNode, WorkerRegistry};
pub use vitals::{PoolSnapshot, ProbeFailure, VitalsCollector, VitalsSnapshot};
