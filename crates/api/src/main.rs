//! Marketplace gateway entry point.

use std::path::Path;

use api::config::Config;
use entities::EntityDirectory;
use saga::{HttpUserService, HttpWalletService};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, draining gateway");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, draining gateway");
        }
    }
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Create entity directories and external service clients
    let products = EntityDirectory::new();
    let orders = EntityDirectory::new();
    let wallet = HttpWalletService::new(config.wallet_service_url.as_str(), config.reply_timeout)
        .expect("failed to build wallet service client");
    let users = HttpUserService::new(config.user_service_url.as_str(), config.reply_timeout)
        .expect("failed to build user service client");

    // 4. Seed the product catalog
    let loaded = api::catalog::load_into(&products, Path::new(&config.catalog_path))
        .await
        .expect("failed to load product catalog");
    tracing::info!(products = loaded, path = %config.catalog_path, "catalog loaded");

    // 5. Build the application
    let state = api::create_state(products, orders, wallet, users, config.reply_timeout);
    let app = api::create_app(state, metrics_handle);

    // 6. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting marketplace gateway");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}
