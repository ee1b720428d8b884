//! Counter contention scenario.

use std::sync::Arc;

use decider_core::{Decider, Version, VersionedEventStore};
use decider_handlers::{CommandHandler, HandlerConfig, SnapshotHandler};
use decider_postgres::{PgEventStore, PgSnapshotStore};
use decider_samples::{Counter, CounterCommand, CounterEvent};
use sqlx::PgPool;
use tokio::task::JoinSet;
use tracing::debug;

use crate::error::AppError;

/// Outcome of one contention run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentionReport {
    /// Increments that were appended.
    pub accepted: usize,
    /// Increments rejected by the counter's rules.
    pub rejected: usize,
    /// Stream version after the run.
    pub version: Version,
    /// Counter value replayed from the stream.
    pub value: u32,
}

/// Sends `tasks` concurrent increments to the counter in `stream`, one handler
/// clone per task, then replays the stream to check nothing was lost.
///
/// # Errors
///
/// Returns `AppError::Command` for failures other than rule violations and
/// `AppError::Inconsistent` if the replayed stream disagrees with the
/// accepted commands.
pub async fn run_counter_contention(
    pool: &PgPool,
    stream: &str,
    tasks: usize,
    config: &HandlerConfig,
) -> Result<ContentionReport, AppError> {
    let store = Arc::new(PgEventStore::new(pool.clone()));
    let snapshots = Arc::new(PgSnapshotStore::new(pool.clone()));
    let (initial_version, _) =
        VersionedEventStore::<CounterEvent>::load_events(store.as_ref(), stream, 0).await?;
    let handler = SnapshotHandler::new(Counter, stream, store.clone(), snapshots)
        .with_container()
        .with_retry(config.retry)
        .with_policy(config.snapshots);

    let mut set = JoinSet::new();
    for _ in 0..tasks {
        let mut handler = handler.clone();
        set.spawn(async move { handler.handle(&CounterCommand::Increment).await });
    }

    let (mut accepted, mut rejected) = (0, 0);
    while let Some(joined) = set.join_next().await {
        match joined? {
            Ok(_) => accepted += 1,
            Err(error) => {
                let Some(rejection) = error.as_domain() else {
                    return Err(AppError::Command(error));
                };
                debug!(%rejection, "increment rejected");
                rejected += 1;
            }
        }
    }

    let (version, events) =
        VersionedEventStore::<CounterEvent>::load_events(store.as_ref(), stream, 0).await?;
    let state = Counter.fold(Counter.initial_state(), &events);
    let appended = usize::try_from(version - initial_version).unwrap_or_default();
    if appended != accepted {
        return Err(AppError::Inconsistent(format!(
            "{accepted} increments accepted but {appended} events appended to {stream}"
        )));
    }

    Ok(ContentionReport {
        accepted,
        rejected,
        version,
        value: state.value,
    })
}

#[cfg(test)]
mod tests {
    use decider_samples::domain::counter::MAX_VALUE;

    use super::*;

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_every_increment_lands_exactly_once(pool: PgPool) {
        let report = run_counter_contention(&pool, "counter", 40, &HandlerConfig::default())
            .await
            .unwrap();

        assert_eq!(
            report,
            ContentionReport {
                accepted: 40,
                rejected: 0,
                version: 40,
                value: 40,
            }
        );
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_increments_past_max_value_are_rejected(pool: PgPool) {
        let store = PgEventStore::new(pool.clone());
        let near_max = vec![CounterEvent::Incremented; usize::try_from(MAX_VALUE - 5).unwrap()];
        store.try_append_events("counter", 0, &near_max).await.unwrap();

        let report = run_counter_contention(&pool, "counter", 10, &HandlerConfig::default())
            .await
            .unwrap();

        assert_eq!(report.accepted, 5);
        assert_eq!(report.rejected, 5);
        assert_eq!(report.value, MAX_VALUE);
        assert_eq!(report.version, Version::from(MAX_VALUE));
    }
}
