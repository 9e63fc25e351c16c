//! Lectern worker - migrations and the periodic event sweep
//!
//! The HTTP layer runs elsewhere; this binary owns the database lifecycle
//! chores: applying migrations at startup and retiring expired events on a
//! fixed interval.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lectern_core::{config::AppConfig, repository::Repository, services::Services, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("lectern_core={}", config.logging.level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Lectern worker v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    let sweep_interval = Duration::from_secs(config.sweeper.interval_secs);

    // Create repository and services
    let repository = Repository::new(pool);
    let services = Services::new(repository, &config.dashboard);

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    // Background event sweep
    let sweeper = state.services.events.clone();
    tokio::spawn(sweeper.run_sweeper(sweep_interval));

    tracing::info!(
        "Event sweeper running every {}s; press Ctrl-C to stop",
        sweep_interval.as_secs()
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    Ok(())
}
