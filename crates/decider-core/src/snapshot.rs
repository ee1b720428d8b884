//! Snapshot store contract.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::StoreError;
use crate::store::Version;

/// Materialized state of a stream at a known version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot<S> {
    /// Version of the last event folded into `state`.
    pub version: Version,
    /// The folded state.
    pub state: S,
}

/// Identifies one snapshot row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapshotKey {
    /// The snapshotted stream.
    pub stream: String,
    /// Optional partition, typically derived from the decider's schema version.
    pub container: Option<String>,
}

impl SnapshotKey {
    /// Key for an unpartitioned snapshot.
    #[must_use]
    pub fn stream(stream: &str) -> Self {
        Self {
            stream: stream.to_owned(),
            container: None,
        }
    }

    /// Key for a snapshot inside `container`.
    #[must_use]
    pub fn in_container(stream: &str, container: &str) -> Self {
        Self {
            stream: stream.to_owned(),
            container: Some(container.to_owned()),
        }
    }
}

/// Derives a fixed-width container name from a schema version.
#[must_use]
pub fn container_key(schema_version: &str) -> String {
    Sha256::digest(schema_version.as_bytes())
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

/// Keyed single-row cache of folded states.
///
/// A snapshot is a cache, never the source of truth: a snapshot at version V
/// is only a base for replaying the events after V.
#[async_trait]
pub trait SnapshotStore<S>: Send + Sync {
    /// Loads the snapshot stored under `key`, if any.
    async fn try_load_snapshot(&self, key: &SnapshotKey) -> Result<Option<Snapshot<S>>, StoreError>;

    /// Stores `state` at `version` under `key`.
    ///
    /// Replaces an existing snapshot only when `version` is newer.
    async fn save_snapshot(
        &self,
        key: &SnapshotKey,
        version: Version,
        state: &S,
    ) -> Result<(), StoreError>;
}
