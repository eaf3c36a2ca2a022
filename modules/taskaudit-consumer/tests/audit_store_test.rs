//! Integration tests for the Postgres audit store.
//! Requires a Postgres instance. Set DATABASE_TEST_URL or these tests are skipped.

use chrono::NaiveDateTime;
use serde_json::{json, Value};
use sqlx::PgPool;

use taskaudit_consumer::event::AuditRecord;
use taskaudit_consumer::store::{AuditStore, PgAuditStore};
use taskaudit_consumer::{EventProcessor, Outcome};

/// Get a test database pool, or skip if no test DB is available.
async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("DATABASE_TEST_URL").ok()?;
    let pool = PgPool::connect(&url).await.ok()?;

    // Clean slate for each test; the store creates the table itself.
    sqlx::query("DROP TABLE IF EXISTS task_audit_log")
        .execute(&pool)
        .await
        .ok()?;

    Some(pool)
}

async fn read_rows(pool: &PgPool) -> Vec<(String, Option<i32>, Value)> {
    sqlx::query_as::<_, (String, Option<i32>, Value)>(
        "SELECT event_type, task_id, event_data FROM task_audit_log ORDER BY id",
    )
    .fetch_all(pool)
    .await
    .unwrap()
}

#[tokio::test]
async fn record_creates_table_and_inserts_row() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = PgAuditStore::new(pool.clone());

    let event = json!({
        "event": "task.created",
        "task": {"id": 1, "title": "Test Task"},
        "timestamp": "2024-01-01T00:00:00Z",
    });
    store.record(&AuditRecord::from_event(event.clone())).await.unwrap();

    let rows = read_rows(&pool).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].0, "task.created");
    assert_eq!(rows[0].1, Some(1));
    assert_eq!(rows[0].2, event);

    // processed_at is store-assigned at insert time
    let (processed_at,) = sqlx::query_as::<_, (Option<NaiveDateTime>,)>(
        "SELECT processed_at FROM task_audit_log",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert!(processed_at.is_some());
}

#[tokio::test]
async fn repeated_records_reuse_the_table() {
    // The ensure-table step runs on every write and must stay idempotent.
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = PgAuditStore::new(pool.clone());

    for i in 1..=3 {
        store
            .record(&AuditRecord::from_event(
                json!({"event": "task.updated", "taskId": i}),
            ))
            .await
            .unwrap();
    }

    let rows = read_rows(&pool).await;
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.0 == "task.updated"));
    assert_eq!(rows[2].1, Some(3));
}

#[tokio::test]
async fn alternate_and_missing_ids_persist_correctly() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = PgAuditStore::new(pool.clone());

    store
        .record(&AuditRecord::from_event(
            json!({"event": "task.deleted", "taskId": 7}),
        ))
        .await
        .unwrap();
    store.record(&AuditRecord::from_event(json!({}))).await.unwrap();

    let rows = read_rows(&pool).await;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], ("task.deleted".to_string(), Some(7), json!({"event": "task.deleted", "taskId": 7})));
    assert_eq!(rows[1], ("unknown".to_string(), None, json!({})));
}

#[tokio::test]
async fn constraint_violation_rolls_back_and_store_stays_usable() {
    // event_type is VARCHAR(50); an oversized kind fails the insert. The
    // whole transaction must roll back (no partial row) and the connection
    // must remain usable for the next write.
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = PgAuditStore::new(pool.clone());

    let oversized = "x".repeat(60);
    let result = store
        .record(&AuditRecord::from_event(json!({"event": oversized})))
        .await;
    assert!(result.is_err());

    store
        .record(&AuditRecord::from_event(
            json!({"event": "task.created", "task": {"id": 2}}),
        ))
        .await
        .unwrap();

    let rows = read_rows(&pool).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].0, "task.created");
}

#[tokio::test]
async fn processor_contains_store_failure_end_to_end() {
    // Same containment as the mock tests, but through real Postgres: the
    // failed message yields no row, no error escapes, and the loop's next
    // message commits. The skipped message's offset would still advance —
    // the at-most-once gap the bridge accepts.
    let Some(pool) = test_pool().await else {
        return;
    };
    let processor = EventProcessor::new(Box::new(PgAuditStore::new(pool.clone())));

    let oversized = json!({"event": "y".repeat(60), "taskId": 1});
    let first = processor.process(oversized.to_string().as_bytes()).await;
    let second = processor.process(br#"{"event":"task.deleted","taskId":7}"#).await;

    assert_eq!(first, Outcome::RolledBack);
    assert_eq!(second, Outcome::Committed);

    let rows = read_rows(&pool).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].0, "task.deleted");
    assert_eq!(rows[0].1, Some(7));
}
