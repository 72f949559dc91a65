//! Notifier Server - push-notification relay over a per-tenant registry.

use std::net::SocketAddr;
use std::sync::Arc;

use color_eyre::eyre::WrapErr as _;
use tower_http::trace::TraceLayer;

use notifier_http::AppState;
use notifier_push::{ApnsProvider, TenantClients};

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("notifier-server starting");

    // Initialize storage
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:notifier.db".to_string());

    let storage = notifier_storage::SqliteStorage::new(&database_url)
        .wrap_err("failed to initialize storage")?;

    storage
        .run_migrations()
        .wrap_err("failed to run migrations")?;

    // Reload every provisioned tenant; a single bad credential is fatal.
    let clients = Arc::new(TenantClients::new(ApnsProvider::new()));
    clients
        .load_all(&storage)
        .await
        .wrap_err("failed to load tenant push clients")?;

    // Build router
    let state = AppState::new(storage, clients);
    let app = notifier_http::router(state).layer(TraceLayer::new_for_http());

    // Start server
    let port: u16 = match std::env::var("HTTP_PORT") {
        Ok(value) => value.parse().wrap_err("invalid HTTP_PORT")?,
        Err(_) => 30701,
    };
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .wrap_err("failed to bind")?;

    axum::serve(listener, app).await.wrap_err("server error")?;

    Ok(())
}
