//! taskgate gateway - HTTP front for allocating and dispatching tasks.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use taskgate_gateway::{
    routes, AllocationStrategy, AppState, Config, Gateway, PoolMonitor, VitalsCollector,
    WorkerRegistry,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle --version / -V
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("taskgate-gateway {}", VERSION);
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

    tracing::info!("Starting taskgate gateway");

    let strategy = AllocationStrategy::from_name(&config.allocation.strategy)?;
    let registry = Arc::new(WorkerRegistry::from_nodes(config.workers.clone()));
    let settings = config.settings();
    let task = config.task.to_task();

    tracing::info!(
        "Pool: {} workers, strategy {}, task {}",
        registry.len().await,
        strategy.name(),
        task.name()
    );

    let gateway = Arc::new(Gateway::new(task, strategy, registry.clone(), settings));

    let monitor = (config.monitor.interval_secs > 0).then(|| {
        PoolMonitor::new(
            registry,
            VitalsCollector::new(),
            Duration::from_secs(config.monitor.interval_secs),
            settings.probe_timeout,
        )
        .spawn()
    });

    let state = Arc::new(AppState {
        gateway,
        default_criteria: config.allocation.criteria.clone(),
    });
    let app = routes::app(state);

    // Start server
    let addr = config.server.bind_addr();
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        })
        .await?;

    if let Some(monitor) = monitor {
        monitor.abort();
    }

    Ok(())
}
