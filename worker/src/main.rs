//! taskgate worker - heartbeat endpoint and remote task executor.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use taskgate_worker::supervisor::spawn_supervised;
use taskgate_worker::{
    executor, heartbeat, Config, HeartbeatState, RemoteExecutor, SystemVitals, TaskCatalog,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle --version / -V
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("taskgate-worker {}", VERSION);
        return Ok(());
    }

    // Load configuration
    let config = Config::load().map_err(|e| format!("Failed to load configuration: {}", e))?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting taskgate worker: {}", config.worker.name);

    let restart_delay = Duration::from_millis(config.supervisor.restart_delay_ms);

    // Heartbeat listener
    let heartbeat_state = Arc::new(
        HeartbeatState::new(
            config.heartbeat.location(),
            config.worker.name.clone(),
            Arc::new(SystemVitals::new()),
        )
        .with_clients(config.heartbeat.client_filter()),
    );
    let heartbeat_addr = config.heartbeat.bind_addr();
    tracing::info!("Heartbeat listening on {}", heartbeat_addr);
    let heartbeat_task = spawn_supervised("heartbeat", restart_delay, move || {
        let addr = heartbeat_addr.clone();
        let state = heartbeat_state.clone();
        async move {
            let listener = TcpListener::bind(&addr).await?;
            heartbeat::serve(listener, state).await
        }
    });

    // Execution listener
    let catalog = Arc::new(TaskCatalog::builtin());
    tracing::info!(
        "Task catalog: {} (sanity check: {:?})",
        catalog.names().await.join(", "),
        config.executor.sanity_check
    );
    let remote_executor =
        Arc::new(RemoteExecutor::from_kind(catalog, config.executor.sanity_check));
    let executor_addr = config.executor.bind_addr();
    tracing::info!("Executor listening on {}", executor_addr);
    let executor_task = spawn_supervised("executor", restart_delay, move || {
        let addr = executor_addr.clone();
        let remote_executor = remote_executor.clone();
        async move {
            let listener = TcpListener::bind(&addr).await?;
            executor::serve(listener, remote_executor).await
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");
    heartbeat_task.abort();
    executor_task.abort();

    Ok(())
}
