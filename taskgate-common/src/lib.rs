//! taskgate Common Types
//!
//! Shared types used by both the gateway and the workers it dispatches to.

pub mod address;
pub mod envelope;
pub mod protocol;
pub mod task;

pub use address::{AddressError, WorkerAddress};
pub use envelope::{
    DispatchEnvelope, EnvelopeError, OpenedEnvelope, ARGS_PART, CODE_PART, KWARGS_PART,
};
pub use protocol::{ExecutionResult, ExecutionStatus, HeartbeatReport};
pub use task::{CallableRef, Kwargs, Task};
