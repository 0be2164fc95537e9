//! HTTP server assembly: router, listener binding and the serve loop.

use std::io::ErrorKind;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    auth::AdminSecret, config::Config, handlers, services::key_service::KeyService,
    store::JsonFileStore,
};

/// Shared state handed to every handler.
pub type AppState = Arc<KeyService<JsonFileStore>>;

/// Build the HTTP router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api/keys", get(handlers::keys::list_keys))
        .route("/api/keys/generate", post(handlers::keys::generate_key))
        .route("/api/keys/validate", post(handlers::keys::validate_key))
        .route("/api/keys/deactivate", post(handlers::keys::deactivate_key))
        // Browser-based admin and client front-ends call from other origins
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `host:port`, moving on to the next port while the address is taken.
///
/// Tries `port`, `port + 1`, ... `port + extra_attempts`. Errors other than
/// `AddrInUse` are returned immediately.
pub async fn bind_with_fallback(
    host: &str,
    port: u16,
    extra_attempts: u16,
) -> std::io::Result<TcpListener> {
    let mut candidate = port;
    let mut remaining = extra_attempts;

    loop {
        match TcpListener::bind((host, candidate)).await {
            Ok(listener) => return Ok(listener),
            Err(e) if e.kind() == ErrorKind::AddrInUse && remaining > 0 => {
                let Some(next) = candidate.checked_add(1) else {
                    return Err(e);
                };
                tracing::warn!("Port {} is in use, trying {}", candidate, next);
                candidate = next;
                remaining -= 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Build the key service described by `config` and make sure its store exists.
pub async fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let store = JsonFileStore::new(&config.key_store_path, config.store_fail_open);
    let service = KeyService::new(store, AdminSecret::new(config.admin_secret()))
        .with_default_duration(config.default_duration_days)?;

    service.initialize().await?;
    tracing::info!(path = %config.key_store_path, "Key store ready");

    Ok(Arc::new(service))
}

/// Run the server until Ctrl-C.
pub async fn run(config: Config) -> anyhow::Result<()> {
    if config.uses_dev_secret() {
        tracing::warn!("ADMIN_SECRET is not set; using the development default. Do not run like this in production");
    }

    let state = build_state(&config).await?;
    let app = build_router(state);

    let listener = bind_with_fallback(
        &config.server_host,
        config.server_port,
        config.port_fallback_attempts,
    )
    .await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
