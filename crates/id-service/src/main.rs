//! Identity Controller
//!
//! Entry point for the Gatehouse identity service. Owns accounts,
//! credentials, token issuance and revocation.

#![warn(clippy::pedantic)]

use std::net::SocketAddr;
use std::sync::Arc;

use id_service::config::Config;
use id_service::observability::metrics::init_metrics_recorder;
use id_service::repositories::{InMemoryUserStore, TracingAuditLog};
use id_service::routes::{self, AppState};
use id_service::services::AuthService;

use common::signing::SigningAuthority;
use common::store::{RedisStore, TtlStore};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "id_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Identity Controller");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        access_ttl_secs = config.token_ttls.access.as_secs(),
        refresh_ttl_secs = config.token_ttls.refresh.as_secs(),
        session_cache_ttl_secs = config.session_cache_ttl.as_secs(),
        bcrypt_cost = config.bcrypt_cost,
        store_op_timeout_ms = config.store_op_timeout.as_millis(),
        "Configuration loaded successfully"
    );

    if config.placeholder_secret_active() {
        warn!(
            "AUTH_SIGNING_SECRET is the built-in development value; \
             set a unique secret before exposing this service"
        );
    }

    // Initialize Prometheus metrics recorder
    // This must happen before any metrics are recorded
    info!("Initializing Prometheus metrics recorder...");
    let prometheus_handle = init_metrics_recorder().map_err(|e| {
        error!(error = %e, "Failed to install Prometheus metrics recorder");
        e
    })?;
    info!("Prometheus metrics recorder initialized");

    // Connect to Redis. Do NOT log redis_url as it may contain credentials.
    info!("Connecting to Redis...");
    let store: Arc<dyn TtlStore> = Arc::new(
        RedisStore::connect(&config.redis_url, config.store_op_timeout)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to connect to Redis");
                e
            })?,
    );
    info!("Redis connection established");

    // User records live in process memory until a durable backend lands.
    let users = Arc::new(InMemoryUserStore::new());
    info!("Using in-memory user store");

    let audit = Arc::new(TracingAuditLog);

    let authority = SigningAuthority::new(&config.signing_secret);

    let auth = AuthService::new(
        users,
        audit,
        Arc::clone(&store),
        authority,
        config.token_ttls,
        config.session_cache_ttl,
        config.bcrypt_cost,
    );

    // Parse bind address before moving config
    let bind_address = config.bind_address.clone();

    // Create application state
    let state = Arc::new(AppState { auth, store });

    // Build application routes
    let app = routes::build_routes(state, prometheus_handle);

    // Parse bind address
    let addr: SocketAddr = bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("Identity Controller listening on {}", addr);

    // Start server with graceful shutdown support
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Identity Controller shutdown complete");

    Ok(())
}

/// Listens for shutdown signals (SIGTERM, SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
