use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Broker error: {0}")]
    Broker(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
