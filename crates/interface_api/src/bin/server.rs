//! Rental Insurance API - Server Binary
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin rental-insurance-api
//!
//! API_PORT=8080 API_DATABASE_URL=postgres://... cargo run --bin rental-insurance-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` / `API_PORT` - bind address (default: 0.0.0.0:8080)
//! * `API_DATABASE_URL` - PostgreSQL connection string
//! * `API_DATABASE_MAX_CONNECTIONS` - pool size (default: 10)
//! * `API_LOG_LEVEL` - `EnvFilter` directive (default: info); `RUST_LOG` wins when set
//! * `API_LOG_JSON` - emit JSON log lines
//! * `API_PROVIDER_TEST_URL` / `API_PROVIDER_LIVE_URL` - underwriting provider base URLs
//! * `API_PROVIDER_TIMEOUT_SECS` - deadline for each provider call
//! * `API_TOKEN_TTL_SECS` - provider token cache lifetime
//! * `API_PAYMENT_CLAIM_LEASE_SECS` - age after which a pending payment may be retried

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use infra_db::{
    create_pool, run_migrations, PostgresEmailOutbox, PostgresNotificationInbox,
    PostgresPolicyRecordAdapter, PostgresRentalLedger, PostgresTenantAdapter,
};
use infra_external::HttpUnderwritingProvider;
use interface_api::{config::ApiConfig, create_router, AppState, PipelinePorts};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = load_config();
    init_tracing(&config);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "Starting rental insurance API server"
    );

    let pool = create_pool(config.database_config())
        .await
        .context("connecting to database")?;
    run_migrations(&pool).await.context("applying migrations")?;

    let provider = HttpUnderwritingProvider::new(config.provider_endpoints())
        .context("building underwriting provider client")?;
    let tenants = Arc::new(PostgresTenantAdapter::new(pool.clone()));

    let ports = PipelinePorts {
        credentials: tenants.clone(),
        admins: tenants,
        provider: Arc::new(provider),
        records: Arc::new(PostgresPolicyRecordAdapter::new(pool.clone())),
        rentals: Arc::new(PostgresRentalLedger::new(pool.clone())),
        inbox: Arc::new(PostgresNotificationInbox::new(pool.clone())),
        email: Arc::new(PostgresEmailOutbox::new(pool)),
    };

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .context("parsing server address")?;
    let app = create_router(AppState::new(ports, config));

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Loads configuration from `API_`-prefixed variables, falling back to defaults
fn load_config() -> ApiConfig {
    ApiConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Invalid API configuration ({e}); using defaults");
        ApiConfig::default()
    })
}

fn init_tracing(config: &ApiConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    if config.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

/// Waits for Ctrl+C or SIGTERM so in-flight requests can finish
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
