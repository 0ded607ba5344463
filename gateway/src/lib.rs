//! taskgate gateway.
//!
//! Binds one task and runs it on a pool of workers. Each call takes a fresh
//! heartbeat snapshot of the pool, lets the configured allocation strategy
//! pick a reachable worker, and dispatches the task to that worker's
//! execution endpoint.

pub mod allocation;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod pool;
pub mod routes;

pub use allocation::{AllocationError, AllocationQueue, AllocationStrategy, Criteria};
pub use config::Config;
pub use error::{DispatchError, GatewayError};
pub use gateway::{Gateway, GatewaySettings, DISPATCH_ID_HEADER};
pub use pool::{
    PoolMonitor, PoolSnapshot, VitalsCollector, VitalsSnapshot, WorkerNode, WorkerRegistry,
};

use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub gateway: Arc<Gateway>,
    /// Criteria for calls that do not name one.
    pub default_criteria: String,
}
