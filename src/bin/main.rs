//! CMX receiver binary
//!
//! # Usage
//!
//! ```bash
//! # Run with built-in defaults (port 5000, in-memory store)
//! cmx-receiver
//!
//! # Supply the validator token and shared secret
//! cmx-receiver -v <validator> -s <secret>
//!
//! # Forward records to an HTTP sink and enforce the secret check
//! cmx-receiver --sink-url http://sink:8080 --reject-on-secret-mismatch
//! ```

use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use cmx_receiver::config::{Cli, ReceiverConfig};
use cmx_receiver::handler::{create_router, AppState};
use cmx_receiver::store::{HttpStore, MemoryStore, PayloadStore};
use cmx_receiver::telemetry::ReceiverMetrics;

#[tokio::main]
async fn main() {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = Arc::new(ReceiverConfig::from_cli(&cli));

    let store: Arc<dyn PayloadStore> = match &cli.sink_url {
        Some(url) => Arc::new(HttpStore::new(url.clone(), cli.sink_timeout_ms)),
        None => Arc::new(MemoryStore::new()),
    };

    let metrics = match ReceiverMetrics::new() {
        Ok(metrics) => Arc::new(metrics),
        Err(e) => {
            eprintln!("Failed to initialize metrics: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        store = store.backend_tag(),
        supported_version = %config.supported_version,
        reject_on_secret_mismatch = config.reject_on_secret_mismatch,
        reject_on_version_mismatch = config.reject_on_version_mismatch,
        "starting cmx-receiver"
    );

    let state = AppState::new(config, store, metrics);
    let app = create_router(state);

    let addr = format!("{}:{}", cli.listen, cli.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    info!(addr = %addr, "listening");

    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => tracing::error!("failed to listen for shutdown signal: {}", e),
    }
}
