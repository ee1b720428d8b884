//! Integration tests for the `PostgreSQL` stores.

use std::sync::Arc;

use decider_core::{
    AppendOutcome, BinarySerializer, SimpleEventStore, SnapshotKey, SnapshotStore, StoreError,
    Version, VersionedEventStore,
};
use decider_handlers::{CommandHandler, SnapshotHandler, VersionedHandler};
use decider_postgres::{PgEventStore, PgSimpleEventStore, PgSnapshotStore};
use decider_samples::{
    Counter, CounterCommand, CounterEvent, CounterState, TodoItem, TodoListEvent, TodoListState,
};
use futures::TryStreamExt;
use sqlx::PgPool;

fn added(id: &str) -> TodoListEvent {
    TodoListEvent::TodoAdded {
        id: id.to_owned(),
        name: format!("todo {id}"),
    }
}

async fn stored_versions(pool: &PgPool, stream: &str) -> Vec<Version> {
    sqlx::query_scalar("SELECT version FROM events WHERE stream = $1 ORDER BY version")
        .bind(stream)
        .fetch_all(pool)
        .await
        .unwrap()
}

// --- load_events ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_load_events_returns_empty_for_unknown_stream(pool: PgPool) {
    let store = PgEventStore::new(pool);

    let (version, events): (Version, Vec<TodoListEvent>) =
        store.load_events("missing", 0).await.unwrap();

    assert_eq!(version, 0);
    assert!(events.is_empty());
}

// --- try_append_events + load_events ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_append_and_load_preserves_order(pool: PgPool) {
    let store = PgEventStore::new(pool.clone());
    let events = vec![added("1"), added("2"), added("3")];

    let outcome = store.try_append_events("todos", 0, &events).await.unwrap();

    assert_eq!(outcome, AppendOutcome::Appended(3));
    let (version, loaded): (Version, Vec<TodoListEvent>) =
        store.load_events("todos", 0).await.unwrap();
    assert_eq!(version, 3);
    assert_eq!(loaded, events);
    assert_eq!(stored_versions(&pool, "todos").await, vec![1, 2, 3]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_load_events_after_version_is_exclusive(pool: PgPool) {
    let store = PgEventStore::new(pool);
    store
        .try_append_events("todos", 0, &[added("1"), added("2"), added("3")])
        .await
        .unwrap();

    let (version, loaded): (Version, Vec<TodoListEvent>) =
        store.load_events("todos", 2).await.unwrap();

    assert_eq!(version, 3);
    assert_eq!(loaded, vec![added("3")]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_stream_isolation(pool: PgPool) {
    let store = PgEventStore::new(pool);

    store.try_append_events("a", 0, &[added("a")]).await.unwrap();
    store.try_append_events("b", 0, &[added("b")]).await.unwrap();

    let (_, loaded_a): (Version, Vec<TodoListEvent>) = store.load_events("a", 0).await.unwrap();
    let (_, loaded_b): (Version, Vec<TodoListEvent>) = store.load_events("b", 0).await.unwrap();
    assert_eq!(loaded_a, vec![added("a")]);
    assert_eq!(loaded_b, vec![added("b")]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_stream_events_matches_load_events(pool: PgPool) {
    let store = PgEventStore::new(pool);
    store
        .try_append_events("todos", 0, &[added("1"), added("2"), added("3")])
        .await
        .unwrap();

    let (loaded_version, loaded): (Version, Vec<TodoListEvent>) =
        store.load_events("todos", 1).await.unwrap();
    let (streamed_version, stream) = store.stream_events("todos", 1).await.unwrap();
    let streamed: Vec<TodoListEvent> = stream.try_collect().await.unwrap();

    assert_eq!(streamed_version, loaded_version);
    assert_eq!(streamed, loaded);
}

// --- concurrency ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_stale_expected_version_returns_catch_up(pool: PgPool) {
    let store = PgEventStore::new(pool.clone());
    store
        .try_append_events("todos", 0, &[added("1"), added("2")])
        .await
        .unwrap();

    let outcome = store
        .try_append_events("todos", 0, &[added("3")])
        .await
        .unwrap();

    assert_eq!(
        outcome,
        AppendOutcome::Conflict {
            actual_version: 2,
            catch_up: vec![added("1"), added("2")],
        }
    );
    assert_eq!(stored_versions(&pool, "todos").await, vec![1, 2]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_expected_version_ahead_of_stream_is_rejected(pool: PgPool) {
    let store = PgEventStore::new(pool);

    let result = store.try_append_events("todos", 5, &[added("1")]).await;

    assert!(matches!(
        result,
        Err(StoreError::VersionAhead {
            expected: 5,
            actual: 0,
            ..
        })
    ));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_concurrent_appends_at_same_version_have_one_winner(pool: PgPool) {
    let store = PgEventStore::new(pool.clone());

    let events_x = [added("x")];
    let events_y = [added("y")];
    let (first, second) = tokio::join!(
        store.try_append_events("todos", 0, &events_x),
        store.try_append_events("todos", 0, &events_y),
    );

    let outcomes = [first.unwrap(), second.unwrap()];
    let appended = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, AppendOutcome::Appended(1)))
        .count();
    assert_eq!(appended, 1);
    assert!(outcomes.iter().any(|outcome| matches!(
        outcome,
        AppendOutcome::Conflict { actual_version: 1, catch_up } if catch_up.len() == 1
    )));
    assert_eq!(stored_versions(&pool, "todos").await, vec![1]);
}

// --- edge cases ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_append_empty_events_is_noop(pool: PgPool) {
    let store = PgEventStore::new(pool.clone());
    let nothing: &[TodoListEvent] = &[];

    let outcome = store.try_append_events("todos", 0, nothing).await.unwrap();

    assert_eq!(outcome, AppendOutcome::Appended(0));
    assert!(stored_versions(&pool, "todos").await.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_binary_serializer_round_trip(pool: PgPool) {
    let store = PgEventStore::with_serializer(pool, BinarySerializer);
    let events = vec![added("1"), TodoListEvent::TodoToggled { id: "1".to_owned() }];

    store.try_append_events("todos", 0, &events).await.unwrap();

    let (_, loaded): (Version, Vec<TodoListEvent>) = store.load_events("todos", 0).await.unwrap();
    assert_eq!(loaded, events);
}

// --- simple store ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_simple_store_appends_after_last_version(pool: PgPool) {
    let store = PgSimpleEventStore::new(pool.clone());

    store.append_events("todos", &[added("1")]).await.unwrap();
    store
        .append_events("todos", &[added("2"), added("3")])
        .await
        .unwrap();

    let from_two: Vec<TodoListEvent> = store.load_events("todos", 2).await.unwrap();
    assert_eq!(from_two, vec![added("2"), added("3")]);
    assert_eq!(stored_versions(&pool, "todos").await, vec![1, 2, 3]);
}

// --- snapshots ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_snapshot_upsert_keeps_the_newest(pool: PgPool) {
    let store = PgSnapshotStore::new(pool);
    let key = SnapshotKey::stream("todos");
    let newer = TodoListState {
        todos: vec![TodoItem {
            id: "1".to_owned(),
            name: "newer".to_owned(),
            done: true,
        }],
    };

    store.save_snapshot(&key, 3, &newer).await.unwrap();
    store
        .save_snapshot(&key, 2, &TodoListState::default())
        .await
        .unwrap();

    let snapshot = SnapshotStore::<TodoListState>::try_load_snapshot(&store, &key)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.version, 3);
    assert_eq!(snapshot.state, newer);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_snapshot_containers_are_separate_rows(pool: PgPool) {
    let store = PgSnapshotStore::new(pool);
    let plain = SnapshotKey::stream("counter");
    let contained = SnapshotKey::in_container("counter", "v2");

    store
        .save_snapshot(&contained, 4, &CounterState::default())
        .await
        .unwrap();

    let missing = SnapshotStore::<CounterState>::try_load_snapshot(&store, &plain)
        .await
        .unwrap();
    let found = SnapshotStore::<CounterState>::try_load_snapshot(&store, &contained)
        .await
        .unwrap();
    assert!(missing.is_none());
    assert_eq!(found.map(|snapshot| snapshot.version), Some(4));
}

// --- handlers over PostgreSQL ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_concurrent_handlers_produce_contiguous_versions(pool: PgPool) {
    let store = Arc::new(PgEventStore::new(pool.clone()));
    let handler = VersionedHandler::new(Counter, "counter", store);

    let mut set = tokio::task::JoinSet::new();
    for _ in 0..50 {
        let mut handler = handler.clone();
        set.spawn(async move { handler.handle(&CounterCommand::Increment).await });
    }
    while let Some(joined) = set.join_next().await {
        assert_eq!(joined.unwrap().unwrap(), vec![CounterEvent::Incremented]);
    }

    let expected: Vec<Version> = (1..=50).collect();
    assert_eq!(stored_versions(&pool, "counter").await, expected);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_snapshot_handler_resumes_from_stored_snapshot(pool: PgPool) {
    let store = Arc::new(PgEventStore::new(pool.clone()));
    let snapshots = Arc::new(PgSnapshotStore::new(pool));
    let mut handler = SnapshotHandler::new(Counter, "counter", store.clone(), snapshots.clone())
        .with_container();

    for _ in 0..3 {
        handler.handle(&CounterCommand::Increment).await.unwrap();
    }
    handler.handle(&CounterCommand::Decrement).await.unwrap();

    let snapshot = SnapshotStore::<CounterState>::try_load_snapshot(
        snapshots.as_ref(),
        handler.snapshot_key(),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(snapshot.version, 4);
    assert_eq!(snapshot.state.value, 2);
}
