//! Shape extraction for incoming task events.
//!
//! Events arrive as arbitrary JSON. Two fields are recognized: `event` (the
//! kind) and a task identifier carried either on a nested `task` object or as
//! a top-level `taskId`. Everything else is opaque and stored verbatim.

use serde_json::Value;

/// Sentinel kind for events that don't carry one.
pub const UNKNOWN_EVENT_TYPE: &str = "unknown";

/// Where an event's task identifier came from, if anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskIdSource {
    /// `task.id` on a populated nested task object.
    NestedTask(i32),
    /// Top-level `taskId`, consulted when there is no usable nested object.
    AlternateField(i32),
    /// Neither field carries an integer identifier.
    Missing,
}

/// Resolve the task identifier for an event.
///
/// A populated `task` object claims the identifier slot: its `id` wins, and
/// if it has no usable `id` the result is `Missing` with no fallback. Only
/// when `task` is absent, null, or an empty object does `taskId` apply.
pub fn task_id_source(event: &Value) -> TaskIdSource {
    match event.get("task") {
        Some(Value::Object(task)) if !task.is_empty() => match as_task_id(task.get("id")) {
            Some(id) => TaskIdSource::NestedTask(id),
            None => TaskIdSource::Missing,
        },
        _ => match as_task_id(event.get("taskId")) {
            Some(id) => TaskIdSource::AlternateField(id),
            None => TaskIdSource::Missing,
        },
    }
}

fn as_task_id(value: Option<&Value>) -> Option<i32> {
    value
        .and_then(Value::as_i64)
        .and_then(|id| i32::try_from(id).ok())
}

/// One audit row, derived from an event. `id` and `processed_at` are assigned
/// by the store at insert time.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecord {
    pub event_type: String,
    pub task_id: Option<i32>,
    /// The full original event, kept verbatim for forensic replay.
    pub payload: Value,
}

impl AuditRecord {
    pub fn from_event(event: Value) -> Self {
        let event_type = event
            .get("event")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_EVENT_TYPE)
            .to_string();

        let task_id = match task_id_source(&event) {
            TaskIdSource::NestedTask(id) | TaskIdSource::AlternateField(id) => Some(id),
            TaskIdSource::Missing => None,
        };

        Self {
            event_type,
            task_id,
            payload: event,
        }
    }
}
