//! Demo error types.

use decider_core::{ConfigError, HandleError, StoreError};
use thiserror::Error;

/// Startup and runtime errors of the demo.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Schema migration failure.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Event or snapshot store failure outside a command.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A command failed for a reason other than a business rule.
    #[error("command error: {0}")]
    Command(HandleError),

    /// A worker task panicked or was cancelled.
    #[error("task error: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// The stream does not hold the expected events.
    #[error("inconsistent stream: {0}")]
    Inconsistent(String),
}
