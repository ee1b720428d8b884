//! Shared test stores for deciders and command handlers.

mod event_store;
mod failing;
mod racing;
mod snapshot_store;

pub use event_store::InMemoryEventStore;
pub use failing::FailingStore;
pub use racing::RacingEventStore;
pub use snapshot_store::InMemorySnapshotStore;
