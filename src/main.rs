//! pointcast - point weather series resampled from chunked time-series stores
//!
//! This is the main entry point for the pointcast application.

use anyhow::Context;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::signal;
use tracing::info;

use pointcast::handlers::{create_router, heartbeat};
use pointcast::{
    init_tracing, log_error, log_operation_end, log_operation_start, AppState, Config,
    PointcastError,
};

fn main() -> anyhow::Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    init_tracing(&config.log_level);
    info!("Starting pointcast v{}", env!("CARGO_PKG_VERSION"));

    let mut runtime = tokio::runtime::Builder::new_multi_thread();
    if let Some(workers) = config.server.workers {
        runtime.worker_threads(workers);
    }
    let runtime = runtime
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    runtime.block_on(serve(config))
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let started = Instant::now();
    log_operation_start("open_domains", Some(&format!("{} domains", config.data.domains.len())));
    let state = AppState::from_config_shared(config.clone()).map_err(|e| {
        log_error(&e, "opening domains");
        log_operation_end("open_domains", started, false);
        e
    })?;
    state.validate().context("Invalid application state")?;
    log_operation_end("open_domains", started, true);

    info!("Serving {} domains", state.domains.len());
    info!("Serving {} variables", state.variables.len());

    heartbeat::mark_started();
    let app = create_router(state);

    let addr = SocketAddr::from((
        config
            .server
            .host
            .parse::<std::net::IpAddr>()
            .map_err(|e| PointcastError::Config {
                message: format!("Invalid host address: {}", e),
            })?,
        config.server.port,
    ));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| PointcastError::Server {
            message: format!("Failed to bind to {}: {}", addr, e),
        })?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| PointcastError::Server {
            message: format!("Server error: {}", e),
        })?;

    info!("Server has been gracefully shut down");
    Ok(())
}

/// Wait for a shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
