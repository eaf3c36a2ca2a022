//! The event processor: one raw message in, one committed audit row out, or a
//! contained failure with zero side effects.

use serde_json::Value;
use tracing::{error, info};

use crate::event::AuditRecord;
use crate::store::AuditStore;

/// Terminal outcome of one processed message. There is no third state: the
/// write either committed or everything was rolled back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Committed,
    RolledBack,
}

pub struct EventProcessor {
    store: Box<dyn AuditStore>,
}

impl EventProcessor {
    pub fn new(store: Box<dyn AuditStore>) -> Self {
        Self { store }
    }

    /// Convert one raw message into one audit row.
    ///
    /// Failures never escape to the receive loop: a malformed payload or a
    /// failed store write is logged, reported as `RolledBack`, and the loop
    /// moves on. Because the broker auto-commits offsets on its own cadence,
    /// the skipped message's offset still advances and the event is gone from
    /// the audit trail — the bridge's accepted at-most-once semantics.
    pub async fn process(&self, payload: &[u8]) -> Outcome {
        let event: Value = match serde_json::from_slice(payload) {
            Ok(value) => value,
            Err(e) => {
                error!(error = %e, "Discarding undecodable message");
                return Outcome::RolledBack;
            }
        };

        let record = AuditRecord::from_event(event);

        match self.store.record(&record).await {
            Ok(()) => {
                info!(
                    event_type = record.event_type.as_str(),
                    task_id = record.task_id,
                    "Recorded audit event"
                );
                Outcome::Committed
            }
            Err(e) => {
                error!(
                    event_type = record.event_type.as_str(),
                    task_id = record.task_id,
                    error = %e,
                    "Failed to record audit event"
                );
                Outcome::RolledBack
            }
        }
    }
}
