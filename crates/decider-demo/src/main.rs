//! Decider demo entry point.
//!
//! Connects to `PostgreSQL`, applies the migrations and races `DEMO_TASKS`
//! concurrent increments against a fresh counter stream.

use decider_core::ConfigError;
use decider_handlers::HandlerConfig;
use decider_postgres::PgConfig;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod error;
mod scenario;

use error::AppError;

const DEFAULT_TASKS: usize = 1500;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting decider demo");

    // Read configuration from environment.
    let pg_config = PgConfig::from_env()?;
    let handler_config = HandlerConfig::from_env()?;
    let tasks = match std::env::var("DEMO_TASKS") {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name: "DEMO_TASKS",
            value,
            expected: "a non-negative integer",
        })?,
        Err(_) => DEFAULT_TASKS,
    };

    let pool = pg_config.connect().await?;
    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("Database migrations completed");

    let stream = format!("counter-{}", Uuid::now_v7());
    let report = scenario::run_counter_contention(&pool, &stream, tasks, &handler_config).await?;
    tracing::info!(
        stream = %stream,
        tasks,
        accepted = report.accepted,
        rejected = report.rejected,
        version = report.version,
        value = report.value,
        "Counter contention finished"
    );

    pool.close().await;
    Ok(())
}
