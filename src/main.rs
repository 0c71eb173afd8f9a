//! Parlay Settlement Service
//!
//! Runs the scheduled closer against PostgreSQL. Event updates (and the
//! settlement passes they trigger) are driven through the library by the
//! transport layer.

use anyhow::Context;
use parlay_settlement::config::{AppConfig, LogFormat};
use parlay_settlement::database::{create_pool, run_migrations};
use parlay_settlement::AppState;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("parlay_settlement={},sqlx=warn", config.log_level).into()
    });

    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().with_env_filter(filter).json().init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables first
    dotenv::dotenv().ok();

    let config = AppConfig::from_env()
        .map_err(anyhow::Error::msg)
        .context("Invalid configuration")?;

    init_tracing(&config);

    info!("Parlay settlement service starting");
    info!("Environment: {}", config.environment);
    info!("Closer interval: {:?}", config.closer_interval());

    info!("Connecting to database...");
    let pool = create_pool(&config.database)
        .await
        .context("Failed to create database pool")?;
    info!("Max connections: {}", config.database.max_connections);

    info!("Running database migrations...");
    run_migrations(&pool, None)
        .await
        .context("Database migration failed")?;

    let state = AppState::with_postgres(pool, &config);
    let closer = state.closer(&config);

    let closer_handle = tokio::spawn(async move {
        closer.start().await;
    });
    info!("Event closer started");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, shutting down gracefully...");
        }
        _ = closer_handle => {
            error!("Event closer exited unexpectedly");
        }
    }

    info!("Parlay settlement service shutdown complete");
    Ok(())
}
