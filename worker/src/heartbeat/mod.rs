//! Heartbeat endpoint.
//!
//! Reports the host's identity and load to whoever asks. It runs on its own
//! listener, separate from the execution listener, so a gateway can tell a
//! dead host from a dead execution service.

mod filter;
mod vitals;

pub use filter::ClientFilter;
pub use vitals::{FixedVitals, HostVitals, SystemVitals, VitalsSource};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use taskgate_common::{HeartbeatReport, WorkerAddress};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::error::{Error, Result};

/// Shared state for the heartbeat listener.
pub struct HeartbeatState {
    /// Address reported in `location`.
    pub location: WorkerAddress,
    /// Worker name.
    pub node: String,
    pub vitals: Arc<dyn VitalsSource>,
    /// Peers allowed to read the heartbeat.
    pub clients: ClientFilter,
}

impl HeartbeatState {
    pub fn new(
        location: WorkerAddress,
        node: impl Into<String>,
        vitals: Arc<dyn VitalsSource>,
    ) -> Self {
        Self {
            location,
            node: node.into(),
            vitals,
            clients: ClientFilter::allow_all(),
        }
    }

    pub fn with_clients(mut self, clients: ClientFilter) -> Self {
        self.clients = clients;
        self
    }
}

/// Build the heartbeat router.
pub fn router(state: Arc<HeartbeatState>) -> Router {
    Router::new()
        .route("/", get(heartbeat))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET / - current load and identity of this worker.
async fn heartbeat(
    State(state): State<Arc<HeartbeatState>>,
    remote: Option<ConnectInfo<SocketAddr>>,
) -> Result<Json<HeartbeatReport>> {
    let peer = remote.map(|ConnectInfo(addr)| addr);
    let caller = peer
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    if !state.clients.permits(peer.map(|addr| addr.ip())) {
        tracing::warn!(caller = %caller, "Heartbeat refused for forbidden client");
        return Err(Error::Forbidden(caller));
    }

    let sample = state.vitals.sample();

    tracing::debug!(
        caller = %caller,
        cpu = sample.cpu,
        memory = sample.memory,
        "Heartbeat requested"
    );

    Ok(Json(HeartbeatReport {
        location: state.location.to_string(),
        cpu: sample.cpu,
        memory: sample.memory,
        message: caller,
        node: Some(state.node.clone()),
        timestamp: Some(Utc::now()),
    }))
}

/// Serve the heartbeat endpoint on an already-bound listener.
pub async fn serve(listener: TcpListener, state: Arc<HeartbeatState>) -> std::io::Result<()> {
    let app = router(state).into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, app).await
}
