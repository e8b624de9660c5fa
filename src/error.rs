use crate::domain::message::CorrelationId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed inbound event: {0}")]
    MalformedEvent(String),
    #[error("Acknowledgment timed out for message {0}")]
    AckTimeout(CorrelationId),
    #[error("Max retries exceeded for message {0}")]
    RetryExhausted(CorrelationId),
    #[error("Transport unavailable")]
    TransportUnavailable,
    #[error("No Tokio runtime available to drive acknowledgment timers")]
    NoRuntime,
}

pub type Result<T> = std::result::Result<T, BridgeError>;
