//! The audit store: one transactional write per event.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::warn;

use taskaudit_common::BridgeError;

use crate::event::AuditRecord;

/// Pluggable sink for audit records. One call is one transaction: it either
/// commits a single row or leaves no trace.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn record(&self, record: &AuditRecord) -> Result<(), BridgeError>;
}

/// The audit table is created on first use, not pre-provisioned.
const ENSURE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS task_audit_log (
    id            SERIAL PRIMARY KEY,
    event_type    VARCHAR(50) NOT NULL,
    task_id       INTEGER,
    event_data    JSONB NOT NULL,
    processed_at  TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)
"#;

const INSERT_ROW: &str = r#"
INSERT INTO task_audit_log (event_type, task_id, event_data)
VALUES ($1, $2, $3)
"#;

/// Postgres-backed audit store.
pub struct PgAuditStore {
    pool: PgPool,
}

impl PgAuditStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditStore for PgAuditStore {
    async fn record(&self, record: &AuditRecord) -> Result<(), BridgeError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| BridgeError::Database(e.to_string()))?;

        match write_row(&mut tx, record).await {
            Ok(()) => tx
                .commit()
                .await
                .map_err(|e| BridgeError::Database(e.to_string())),
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed after write error");
                }
                Err(BridgeError::Database(e.to_string()))
            }
        }
    }
}

async fn write_row(
    tx: &mut Transaction<'_, Postgres>,
    record: &AuditRecord,
) -> Result<(), sqlx::Error> {
    // Ensured on every write rather than once at startup. CREATE TABLE IF
    // NOT EXISTS is idempotent and a no-op once the table exists.
    sqlx::query(ENSURE_TABLE).execute(&mut **tx).await?;

    sqlx::query(INSERT_ROW)
        .bind(&record.event_type)
        .bind(record.task_id)
        .bind(&record.payload)
        .execute(&mut **tx)
        .await?;

    Ok(())
}
