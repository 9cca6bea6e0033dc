use server_http::{build_router, monitor, AppState, HttpFetcher};
use shared::config::Config;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Canna Bomb offline proxy...");

    // Load environment variables from .env file (if exists)
    match dotenvy::dotenv() {
        Ok(_) => info!("Loaded environment variables from .env file"),
        Err(_) => info!("No .env file found, using system environment variables"),
    }

    // Load configuration from environment variables
    let config = Config::from_env();

    let fetcher = match HttpFetcher::new(config.upstream_url.clone()) {
        Ok(fetcher) => Arc::new(fetcher),
        Err(e) => {
            error!("Failed to create upstream client: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize state
    let state = AppState::with_fetcher(&config, fetcher.clone());

    // Install and activate once at startup; until then requests pass through
    let worker = state.worker.clone();
    tokio::spawn(async move {
        match worker.start().await {
            Ok(report) => info!(
                "Worker controlling, retained={:?} deleted={:?}",
                report.retained, report.deleted
            ),
            Err(e) => error!("Worker start failed: {}", e),
        }
    });

    let monitor_task = monitor::spawn(state.worker.clone(), fetcher, config.probe_interval_secs);

    // Build router
    let worker = state.worker.clone();
    let router = build_router(state);

    // Start server
    let bind_addr = config.bind_addr();
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", bind_addr, e);
            std::process::exit(1);
        }
    };

    info!("HTTP Server listening on http://{}", bind_addr);
    info!("Proxying to {}", config.upstream_url);

    // Graceful shutdown handler
    if let Err(e) = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
    }

    if let Some(task) = monitor_task {
        task.abort();
    }
    // Let pending cache writes land before exit
    worker.settle().await;
    info!("Server shutdown complete.");
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }

    info!("Shutting down gracefully...");
}
