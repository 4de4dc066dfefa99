use carpool_server::config::ServerConfig;
use carpool_server::service::CarPool;
use carpool_server::storage::{MemoryStore, StorageKind};
use carpool_server::telemetry;
use carpool_server::web::{AppState, create_router};
use tracing::info;

#[tokio::main]
async fn main() {
    let config = ServerConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Invalid configuration: {e}");
        std::process::exit(2);
    });
    telemetry::init(config.log_format, &config.log_filter);

    let store = match config.storage {
        StorageKind::Memory => MemoryStore::new(),
    };
    info!(storage = %config.storage, "storage initialised");

    let state = AppState::new(CarPool::new(store));
    let app = create_router(state);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    info!(%addr, "car pool listening");
    info!("endpoints: GET /status, PUT /cars, POST /journey, POST /dropoff, POST /locate");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
    info!("shut down");
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
