//! taskgate worker.
//!
//! A worker runs two independent listeners:
//! - the heartbeat endpoint, reporting host identity and load
//! - the execution endpoint, running dispatched tasks from its catalog

pub mod config;
pub mod error;
pub mod executor;
pub mod heartbeat;
pub mod supervisor;

pub use config::Config;
pub use executor::{RemoteExecutor, SanityCheck, TaskCatalog, TaskFault};
pub use heartbeat::{ClientFilter, HeartbeatState, HostVitals, SystemVitals, VitalsSource};
