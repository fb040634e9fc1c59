//! Interview Result Publisher
//!
//! Sends the result notice to every candidate who passed a round.
//!
//! # Usage
//!
//! ```bash
//! # Standard notice for round 1
//! cargo run --bin publish-results -- 1
//!
//! # Custom text for round 2
//! cargo run --bin publish-results -- 2 "请于本周五前确认二面时间"
//! ```

use anyhow::{Context, bail};
use interview_booking::providers::MailNotifier;
use interview_booking::stores::{PostgresCandidateRepository, PostgresSlotRepository, RedisSlotLock};
use interview_booking::{AdminService, BookingEnvironment, Config, Publication};
use interview_booking_core::Round;
use interview_booking_core::environment::SystemClock;
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

    let mut args = std::env::args().skip(1);
    let Some(raw_round) = args.next() else {
        bail!("usage: publish-results <round> [custom body]");
    };
    let round = Round::try_from(raw_round.parse::<i16>().context("round must be a number")?)?;
    let publication = match args.next() {
        Some(body) => Publication::Custom { subject: None, body },
        None => Publication::Default,
    };

    let config = Config::from_env();
    let pool = PgPoolOptions::new()
        .max_connections(config.postgres.max_connections)
        .acquire_timeout(Duration::from_secs(config.postgres.connect_timeout))
        .connect(&config.postgres.url)
        .await
        .context("connecting to PostgreSQL")?;

    let notifier = MailNotifier::from_config(&config.smtp)?;
    if matches!(notifier, MailNotifier::Console(_)) {
        tracing::warn!("SMTP_PASSWORD not set; notices will only be logged");
    }

    let env = BookingEnvironment::new(
        RedisSlotLock::new(&config.redis.url).await?,
        PostgresSlotRepository::new(pool.clone()),
        PostgresCandidateRepository::new(pool),
        notifier,
        SystemClock,
        config.booking,
    );
    let admin = AdminService::new(env);

    let dispatch = admin.publish_results(round, &publication).await?;
    let dispatched = dispatch.dispatched();
    let delivered = dispatch.delivered().await;
    tracing::info!(round = %round, dispatched, delivered, "✓ Results published");

    Ok(())
}
