//! Error taxonomy.
//!
//! Only domain rule violations and unrecoverable storage failures cross the
//! command-handler boundary. Version conflicts are an ordinary
//! [`AppendOutcome`](crate::store::AppendOutcome) and never appear here.

use thiserror::Error;

use crate::store::Version;

/// Raised by `decide` when a command is not valid for the current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A business rule rejected the command.
    #[error("{0}")]
    RuleViolation(String),
}

impl DomainError {
    /// Shorthand for [`DomainError::RuleViolation`].
    pub fn rule(message: impl Into<String>) -> Self {
        Self::RuleViolation(message.into())
    }
}

/// Failures of the durable log or of the serialization layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connectivity, constraint or query failure unrelated to the version race.
    #[error("database error: {0}")]
    Database(String),

    /// A value could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The caller expected a version the stream has not reached yet.
    #[error("stream {stream} is at version {actual}, cannot append after version {expected}")]
    VersionAhead {
        /// The stream that was targeted.
        stream: String,
        /// The version the caller expected.
        expected: Version,
        /// The stream's last version.
        actual: Version,
    },

    /// The store reported a conflict without advancing past the expected version.
    #[error("stream {stream} reported a conflict at version {actual} for expected version {expected}")]
    InconsistentConflict {
        /// The stream that was targeted.
        stream: String,
        /// The version the caller expected.
        expected: Version,
        /// The version reported by the store.
        actual: Version,
    },
}

/// Errors surfaced by a command handler.
#[derive(Debug, Error)]
pub enum HandleError {
    /// The decider rejected the command.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Every allowed attempt lost the race to a concurrent writer.
    #[error("gave up on stream {stream} after {attempts} conflicting appends")]
    TooManyConflicts {
        /// The contended stream.
        stream: String,
        /// How many appends were attempted.
        attempts: u32,
    },
}

impl HandleError {
    /// Returns the domain error if the decider rejected the command.
    #[must_use]
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            Self::Domain(err) => Some(err),
            _ => None,
        }
    }
}

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("{0} environment variable must be set")]
    Missing(&'static str),

    /// A variable is set to a value that cannot be parsed.
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// The rejected value.
        value: String,
        /// Description of the accepted values.
        expected: &'static str,
    },
}
