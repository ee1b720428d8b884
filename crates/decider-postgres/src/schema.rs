//! SQL statements against the `events` and `snapshots` tables.
//!
//! The tables themselves are created by the workspace migrations.

/// Last version of a stream, `0` when it has no events.
pub const SELECT_LAST_VERSION: &str = r"
SELECT COALESCE(MAX(version), 0)
FROM events
WHERE stream = $1
";

/// Events of a stream from a version onwards, inclusive.
pub const SELECT_EVENTS_FROM: &str = r"
SELECT version, body
FROM events
WHERE stream = $1 AND version >= $2
ORDER BY version
";

/// Events of a stream in `($2, $3]`.
pub const SELECT_EVENTS_BETWEEN: &str = r"
SELECT version, body
FROM events
WHERE stream = $1 AND version > $2 AND version <= $3
ORDER BY version
";

/// Inserts a batch of events of one stream in a single statement.
pub const INSERT_EVENTS: &str = r"
INSERT INTO events (event_id, stream, version, body, recorded_at)
SELECT e.event_id, $1, e.version, e.body, e.recorded_at
FROM UNNEST($2::UUID[], $3::BIGINT[], $4::BYTEA[], $5::TIMESTAMPTZ[])
    AS e(event_id, version, body, recorded_at)
";

/// The snapshot stored under `(stream, container)`.
pub const SELECT_SNAPSHOT: &str = r"
SELECT version, body
FROM snapshots
WHERE stream = $1 AND container = $2
";

/// Upserts a snapshot, never replacing a newer one.
pub const UPSERT_SNAPSHOT: &str = r"
INSERT INTO snapshots (stream, container, version, body, taken_at)
VALUES ($1, $2, $3, $4, NOW())
ON CONFLICT (stream, container) DO UPDATE SET
    version = EXCLUDED.version,
    body = EXCLUDED.body,
    taken_at = EXCLUDED.taken_at
WHERE snapshots.version < EXCLUDED.version
";
