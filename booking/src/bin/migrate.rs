//! Interview Booking Migrations
//!
//! Applies the schema migrations and checks that the slot lock store is
//! reachable.
//!
//! # Usage
//!
//! ```bash
//! # Start infrastructure
//! docker compose up -d
//!
//! # Apply migrations
//! cargo run --bin migrate
//! ```

use anyhow::Context;
use interview_booking::Config;
use interview_booking::stores::{PostgresSlotRepository, RedisSlotLock};
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,interview_booking=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!(
        redis = %config.redis.url,
        max_connections = config.postgres.max_connections,
        "Configuration loaded"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.postgres.max_connections)
        .acquire_timeout(Duration::from_secs(config.postgres.connect_timeout))
        .connect(&config.postgres.url)
        .await
        .context("connecting to PostgreSQL")?;

    PostgresSlotRepository::new(pool)
        .migrate()
        .await
        .context("applying migrations")?;
    tracing::info!("✓ Migrations applied");

    let lock = RedisSlotLock::new(&config.redis.url)
        .await
        .context("connecting to Redis")?;
    lock.ping().await.context("pinging Redis")?;
    tracing::info!("✓ Slot lock store reachable");

    Ok(())
}
