use anyhow::Result;
use rdkafka::consumer::Consumer;
use rdkafka::message::Message;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use taskaudit_common::Config;
use taskaudit_consumer::bootstrap::{acquire_store_connection, acquire_subscription};
use taskaudit_consumer::{EventProcessor, PgAuditStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("taskaudit=info".parse()?))
        .init();

    info!("Task audit bridge starting...");

    // Load config
    let config = Config::from_env();

    // Broker first: unreachable after the retry budget is a fatal startup
    // condition and the loop is never entered. Store second: no retry.
    let consumer = match acquire_subscription(&config.kafka_broker).await {
        Ok(consumer) => consumer,
        Err(e) => {
            error!(error = %e, "Failed to connect to broker after maximum retries");
            return Err(e.into());
        }
    };
    let pool = acquire_store_connection(&config).await?;

    let processor = EventProcessor::new(Box::new(PgAuditStore::new(pool.clone())));

    info!("Consumer ready, waiting for messages...");

    // Single-consumer pull loop: one message fully processed, store
    // round-trip included, before the next is requested.
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received, shutting down");
                break;
            }
            received = consumer.recv() => match received {
                Ok(message) => {
                    let payload = message.payload().unwrap_or_default();
                    debug!(bytes = payload.len(), "Received message");
                    processor.process(payload).await;
                }
                Err(e) => warn!(error = %e, "Receive error from broker"),
            }
        }
    }

    // Both handles are released on every exit path from the loop.
    consumer.unsubscribe();
    pool.close().await;
    info!("Shutdown complete");

    Ok(())
}
