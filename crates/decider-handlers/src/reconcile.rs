//! Optimistic append loop shared by the versioned handlers.

use decider_core::{AppendOutcome, Decider, HandleError, StoreError, Version, VersionedEventStore};
use tracing::{debug, warn};

use crate::retry::RetryPolicy;

/// Outcome of a successful decide-and-append.
#[derive(Debug)]
pub(crate) struct Committed<S, E> {
    /// Version the winning append was conditioned on.
    pub expected_version: Version,
    /// Stream version after the append.
    pub version: Version,
    /// State after folding the appended events.
    pub state: S,
    /// The appended events.
    pub events: Vec<E>,
}

/// Decides `command` against `state` and appends the events at `version`.
///
/// On conflict the catch-up events are folded into the state and the same
/// command is decided again, until an append wins, the decider rejects the
/// command, or `retry` runs out of attempts. A decision producing no events
/// appends nothing.
pub(crate) async fn decide_and_append<D: Decider>(
    decider: &D,
    store: &dyn VersionedEventStore<D::Event>,
    stream: &str,
    retry: &RetryPolicy,
    mut version: Version,
    mut state: D::State,
    command: &D::Command,
) -> Result<Committed<D::State, D::Event>, HandleError> {
    let mut attempts: u32 = 0;
    loop {
        let events = decider.decide(command, &state)?;
        if events.is_empty() {
            return Ok(Committed {
                expected_version: version,
                version,
                state,
                events,
            });
        }

        attempts = attempts.saturating_add(1);
        match store.try_append_events(stream, version, &events).await? {
            AppendOutcome::Appended(new_version) => {
                let state = decider.fold(state, &events);
                return Ok(Committed {
                    expected_version: version,
                    version: new_version,
                    state,
                    events,
                });
            }
            AppendOutcome::Conflict {
                actual_version,
                catch_up,
            } => {
                if actual_version <= version {
                    return Err(StoreError::InconsistentConflict {
                        stream: stream.to_owned(),
                        expected: version,
                        actual: actual_version,
                    }
                    .into());
                }
                if retry.is_exhausted(attempts) {
                    warn!(stream, attempts, "giving up after repeated append conflicts");
                    return Err(HandleError::TooManyConflicts {
                        stream: stream.to_owned(),
                        attempts,
                    });
                }
                debug!(
                    stream,
                    attempts,
                    expected_version = version,
                    actual_version,
                    caught_up = catch_up.len(),
                    "append conflict, deciding again against caught-up state"
                );
                state = decider.fold(state, &catch_up);
                version = actual_version;

                let delay = retry.backoff(attempts);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
