//! Connection bootstrapping for the two external systems.
//!
//! The broker and this process start together under compose, so the broker
//! may not be accepting connections yet when we come up. Subscription
//! acquisition rides that out with a bounded fixed-delay retry. The store
//! gets no such grace: a Postgres that is down at startup crashes the
//! process, and restarting is the supervisor's job.

use std::time::Duration;

use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};

use taskaudit_common::{BridgeError, Config};

pub const TOPIC: &str = "task-events";
pub const GROUP_ID: &str = "task-consumer-group";

/// Broker connection attempts before startup is declared failed.
const MAX_ATTEMPTS: u32 = 30;
/// Fixed spacing between attempts.
const RETRY_DELAY: Duration = Duration::from_secs(2);
/// Budget for a single metadata probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Open a subscription to the task-events topic.
///
/// A brand-new consumer group starts from the earliest offset, and offsets
/// are committed automatically on the client's cadence rather than on
/// processing success. Exhausting the retry budget is fatal: the caller is
/// expected to log and exit without entering the receive loop.
pub async fn acquire_subscription(broker: &str) -> Result<StreamConsumer, BridgeError> {
    for attempt in 1..=MAX_ATTEMPTS {
        match try_subscribe(broker) {
            Ok(consumer) => {
                info!(broker, topic = TOPIC, group = GROUP_ID, "Subscribed to task events");
                return Ok(consumer);
            }
            Err(e) => {
                warn!(
                    attempt,
                    max_attempts = MAX_ATTEMPTS,
                    error = %e,
                    "Waiting for broker"
                );
                tokio::time::sleep(RETRY_DELAY).await;
            }
        }
    }

    Err(BridgeError::Broker(format!(
        "broker {broker} unreachable after {MAX_ATTEMPTS} attempts"
    )))
}

fn try_subscribe(broker: &str) -> Result<StreamConsumer, rdkafka::error::KafkaError> {
    let consumer: StreamConsumer = ClientConfig::new()
        .set("bootstrap.servers", broker)
        .set("group.id", GROUP_ID)
        .set("auto.offset.reset", "earliest")
        .set("enable.auto.commit", "true")
        .create()?;

    // Client creation is lazy; a metadata fetch proves the broker is up.
    consumer.fetch_metadata(Some(TOPIC), PROBE_TIMEOUT)?;
    consumer.subscribe(&[TOPIC])?;

    Ok(consumer)
}

/// One long-lived store connection, held for the life of the process.
pub async fn acquire_store_connection(config: &Config) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(1)
        .connect(&config.database_url())
        .await
}
