//! Handler settings read from the environment.

use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Duration;

use decider_core::ConfigError;

use crate::retry::{DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY, RetryPolicy};
use crate::snapshotting::SnapshotPolicy;

/// Total append attempts per command; `0` or unset means no limit.
pub const MAX_ATTEMPTS_VAR: &str = "DECIDER_MAX_ATTEMPTS";
/// Ceiling of the first backoff, in milliseconds.
pub const BACKOFF_BASE_MS_VAR: &str = "DECIDER_BACKOFF_BASE_MS";
/// Ceiling of any backoff, in milliseconds.
pub const BACKOFF_MAX_MS_VAR: &str = "DECIDER_BACKOFF_MAX_MS";
/// Snapshot interval in events; `0` disables snapshot writes.
pub const SNAPSHOT_EVERY_VAR: &str = "DECIDER_SNAPSHOT_EVERY";

/// Retry and snapshot settings shared by the handlers of one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HandlerConfig {
    /// Conflict retry policy.
    pub retry: RetryPolicy,
    /// When snapshot handlers write snapshots.
    pub snapshots: SnapshotPolicy,
}

impl HandlerConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` when a variable is set but is not a
    /// non-negative integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`; unset variables keep their
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` when a variable is set but is not a
    /// non-negative integer.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut retry = RetryPolicy::default();
        if let Some(max_attempts) = parse::<u32>(&lookup, MAX_ATTEMPTS_VAR)? {
            retry.max_attempts = NonZeroU32::new(max_attempts);
        }
        let base_delay = parse::<u64>(&lookup, BACKOFF_BASE_MS_VAR)?
            .map_or(DEFAULT_BASE_DELAY, Duration::from_millis);
        let max_delay = parse::<u64>(&lookup, BACKOFF_MAX_MS_VAR)?
            .map_or(DEFAULT_MAX_DELAY, Duration::from_millis);
        let retry = retry.with_backoff(base_delay, max_delay);

        let snapshots = match parse::<u32>(&lookup, SNAPSHOT_EVERY_VAR)? {
            None => SnapshotPolicy::default(),
            Some(every) => NonZeroU32::new(every).map_or_else(SnapshotPolicy::never, SnapshotPolicy::every),
        };

        Ok(Self { retry, snapshots })
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    let Some(value) = lookup(name) else {
        return Ok(None);
    };
    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::Invalid {
            name,
            value,
            expected: "a non-negative integer",
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_unset_variables_keep_defaults() {
        let config = HandlerConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config, HandlerConfig::default());
    }

    #[test]
    fn test_variables_override_defaults() {
        let config = HandlerConfig::from_lookup(lookup(&[
            (MAX_ATTEMPTS_VAR, "5"),
            (BACKOFF_BASE_MS_VAR, "2"),
            (BACKOFF_MAX_MS_VAR, "100"),
            (SNAPSHOT_EVERY_VAR, "10"),
        ]))
        .unwrap();

        assert_eq!(config.retry.max_attempts, NonZeroU32::new(5));
        assert_eq!(config.retry.base_delay, Duration::from_millis(2));
        assert_eq!(config.retry.max_delay, Duration::from_millis(100));
        assert_eq!(
            config.snapshots,
            SnapshotPolicy::every(NonZeroU32::new(10).unwrap())
        );
    }

    #[test]
    fn test_zero_means_unbounded_or_never() {
        let config = HandlerConfig::from_lookup(lookup(&[
            (MAX_ATTEMPTS_VAR, "0"),
            (SNAPSHOT_EVERY_VAR, "0"),
        ]))
        .unwrap();

        assert_eq!(config.retry.max_attempts, None);
        assert_eq!(config.snapshots, SnapshotPolicy::never());
    }

    #[test]
    fn test_garbage_is_rejected_with_the_variable_name() {
        let error = HandlerConfig::from_lookup(lookup(&[(MAX_ATTEMPTS_VAR, "lots")])).unwrap_err();

        assert!(matches!(
            error,
            ConfigError::Invalid { name: MAX_ATTEMPTS_VAR, ref value, .. } if value == "lots"
        ));
    }
}
