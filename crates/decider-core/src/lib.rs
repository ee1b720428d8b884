//! Decider Core: the decider abstraction and the contracts of its stores.
//!
//! This crate defines the pure decision model (decide/evolve/is-terminal),
//! the combinators that compose deciders, and the traits that event and
//! snapshot stores implement. It contains no infrastructure code.

pub mod decider;
pub mod error;
pub mod keyed_map;
pub mod product;
pub mod serializer;
pub mod snapshot;
pub mod store;
pub mod sum;

pub use decider::Decider;
pub use error::{ConfigError, DomainError, HandleError, StoreError};
pub use keyed_map::KeyedMap;
pub use product::Product;
pub use serializer::{BinarySerializer, JsonSerializer, Serializer};
pub use snapshot::{Snapshot, SnapshotKey, SnapshotStore, container_key};
pub use store::{AppendOutcome, SimpleEventStore, StoredEvent, Version, VersionedEventStore};
pub use sum::{Either, Sum};
