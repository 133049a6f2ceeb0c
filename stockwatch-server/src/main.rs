//! stockwatch server
//!
//! Polls the product catalog for quantity decreases and publishes a stock
//! change event for each one to the message broker.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::{CliOverrides, ConfigLoader};
use server::{build_router, run_server};
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use stockwatch_core::catalog::{PgProductCatalog, ProductCatalog};
use stockwatch_core::processors::{
    LastKnownQuantities, NotificationGate, QueueChangeNotifier, StockPoller,
};
use stockwatch_core::transport::RabbitMqHttpTransport;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// stockwatch - inventory decrease monitor
#[derive(Parser, Debug)]
#[command(name = "stockwatch-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./stockwatch.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Override the poll interval in milliseconds
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Start with stock change notifications disabled
    #[arg(long, default_value = "false")]
    notifications_disabled: bool,

    /// PostgreSQL connection string for the product catalog
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Run database migrations on startup
    #[arg(long, default_value = "false")]
    migrate: bool,

    /// Emit logs as JSON lines
    #[arg(long, default_value = "false")]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing
    init_tracing(args.log_json);

    tracing::info!("Starting stockwatch-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = ConfigLoader::new(
        &args.config,
        CliOverrides {
            listen: args.listen,
            poll_interval_ms: args.poll_interval_ms,
            notifications_disabled: args.notifications_disabled,
        },
    );
    let config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    tracing::info!("Configuration loaded from {:?}", args.config);

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&args.database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    tracing::info!("Database connection established");

    // Run migrations if requested
    if args.migrate {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&db_pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to run migrations: {}", e);
                e
            })?;
        tracing::info!("Migrations completed successfully");
    }

    // Assemble the monitoring pipeline
    let catalog: Arc<dyn ProductCatalog> = Arc::new(PgProductCatalog::new(db_pool.clone()));
    let gate = Arc::new(NotificationGate::new(
        config.monitoring.enabled,
        config.monitoring.queue_name.clone(),
    ));
    let transport = Arc::new(RabbitMqHttpTransport::new(&config.broker)?);
    let notifier = Arc::new(QueueChangeNotifier::new(gate.clone(), transport.clone()));
    let poller = StockPoller::new(
        catalog.clone(),
        notifier,
        LastKnownQuantities::new(),
        &config.monitoring,
    );

    tracing::info!(
        enabled = config.monitoring.enabled,
        queue = %config.monitoring.queue_name,
        "Stock change notifications configured"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poller_handle = tokio::spawn(poller.run(shutdown_rx));

    // Create application state and router
    let state = AppState::new(
        catalog,
        gate,
        transport,
        config.broker.dead_letter_queue.clone(),
    );
    let router = build_router(state);

    // Run the server
    tracing::info!("Starting HTTP server on {}", config.listen);
    let result = run_server(router, config.listen).await;

    // Stop the poller and wait for the in-flight cycle to finish
    let _ = shutdown_tx.send(true);
    if let Err(e) = poller_handle.await {
        tracing::error!(error = %e, "StockPoller task failed");
    }

    // Close database connections gracefully
    tracing::info!("Closing database connections...");
    db_pool.close().await;
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
