//! Decider Handlers: run deciders against event and snapshot stores.
//!
//! Every handler exposes the same operation, [`CommandHandler::handle`]:
//! rebuild the state, decide, append. They differ in how the state is
//! rebuilt:
//!
//! - [`StatelessHandler`] replays the whole stream through the simple store
//!   and has no concurrency protection.
//! - [`VersionedHandler`] replays the stream and resolves append conflicts by
//!   re-deciding against the caught-up state.
//! - [`CachedSession`] keeps the last known (version, state) between calls.
//! - [`SnapshotHandler`] starts from the latest snapshot and replays the tail.

use async_trait::async_trait;
use decider_core::{Decider, HandleError};

pub mod cached;
pub mod config;
mod reconcile;
pub mod retry;
pub mod snapshotting;
pub mod stateless;
pub mod versioned;

pub use cached::CachedSession;
pub use config::HandlerConfig;
pub use retry::RetryPolicy;
pub use snapshotting::{SnapshotHandler, SnapshotPolicy};
pub use stateless::StatelessHandler;
pub use versioned::VersionedHandler;

/// Handles commands for one stream.
///
/// `handle` takes `&mut self` so that handlers holding cached state can only
/// be driven by one caller at a time. Stateless handlers are cheap to clone,
/// one per concurrent task.
#[async_trait]
pub trait CommandHandler<D: Decider>: Send {
    /// Decides `command` against the current state of the stream and appends
    /// the resulting events, returning them.
    ///
    /// # Errors
    ///
    /// Returns `HandleError::Domain` when the decider rejects the command,
    /// `HandleError::Store` on storage failures and
    /// `HandleError::TooManyConflicts` when the retry policy gives up.
    async fn handle(&mut self, command: &D::Command) -> Result<Vec<D::Event>, HandleError>;
}
