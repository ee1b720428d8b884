//! Decider Postgres: `PostgreSQL` implementations of the event and snapshot
//! stores.
//!
//! Events live in the `events` table, one row per event with a unique
//! `(stream, version)` pair; snapshots live in the `snapshots` table, one row
//! per `(stream, container)`. Bodies are stored as `BYTEA` in whatever format
//! the configured serializer produces.

pub mod config;
pub mod pg_event_store;
pub mod pg_simple_event_store;
pub mod pg_snapshot_store;
mod rows;
pub mod schema;

pub use config::PgConfig;
pub use pg_event_store::PgEventStore;
pub use pg_simple_event_store::PgSimpleEventStore;
pub use pg_snapshot_store::PgSnapshotStore;
