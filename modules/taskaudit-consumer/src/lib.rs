//! Task audit bridge: consumes task lifecycle events from Kafka and records
//! them as an append-only audit trail in Postgres.
//!
//! One topic in, one table out. Each message becomes at most one audit row,
//! written under its own transaction; a message that fails to process is
//! rolled back, logged, and skipped.
//!
//! Offset commits are automatic and decoupled from the store write. A failed
//! message still has its offset advanced, so the audit trail can carry silent
//! gaps: at-most-once effective delivery. This is a deliberate property of
//! the bridge, covered by name in the processor tests, and must not be traded
//! for synchronous manual commits without changing the contract.

pub mod bootstrap;
pub mod event;
pub mod processor;
pub mod store;

pub use event::AuditRecord;
pub use processor::{EventProcessor, Outcome};
pub use store::{AuditStore, PgAuditStore};
