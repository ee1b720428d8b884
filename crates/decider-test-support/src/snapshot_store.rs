//! In-memory snapshot store.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use decider_core::{
    JsonSerializer, Serializer, Snapshot, SnapshotKey, SnapshotStore, StoreError, Version,
};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Snapshot store keeping one serialized row per key in memory.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore<S = JsonSerializer> {
    rows: Mutex<HashMap<SnapshotKey, (Version, Vec<u8>)>>,
    saves: Mutex<Vec<(SnapshotKey, Version)>>,
    serializer: S,
}

impl InMemorySnapshotStore {
    /// Creates an empty store encoding states as JSON.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: Serializer> InMemorySnapshotStore<S> {
    /// Returns every save request received, in order, including the ones
    /// ignored because a newer snapshot already existed.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn saves(&self) -> Vec<(SnapshotKey, Version)> {
        self.saves.lock().unwrap().clone()
    }

    /// Returns the version currently stored under `key`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn stored_version(&self, key: &SnapshotKey) -> Option<Version> {
        self.rows.lock().unwrap().get(key).map(|(version, _)| *version)
    }
}

#[async_trait]
impl<T, S> SnapshotStore<T> for InMemorySnapshotStore<S>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
    S: Serializer,
{
    async fn try_load_snapshot(&self, key: &SnapshotKey) -> Result<Option<Snapshot<T>>, StoreError> {
        let Some((version, body)) = self.rows.lock().unwrap().get(key).cloned() else {
            return Ok(None);
        };
        Ok(Some(Snapshot {
            version,
            state: self.serializer.deserialize(&body)?,
        }))
    }

    async fn save_snapshot(
        &self,
        key: &SnapshotKey,
        version: Version,
        state: &T,
    ) -> Result<(), StoreError> {
        let body = self.serializer.serialize(state)?;
        self.saves.lock().unwrap().push((key.clone(), version));
        let mut rows = self.rows.lock().unwrap();
        match rows.get(key) {
            Some((stored, _)) if *stored >= version => {}
            _ => {
                rows.insert(key.clone(), (version, body));
            }
        }
        Ok(())
    }
}
