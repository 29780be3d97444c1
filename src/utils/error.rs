use crate::messaging::BroadcastMessage;
use actix_web::ResponseError;
use thiserror::Error;

/// Represents errors that can occur in the application.
///
/// The `AggregatorError` enum covers errors from various sources, such as aggregate
/// store operations, persistence sink writes, API logic, configuration issues,
/// processing errors, and task join errors.
#[derive(Error, Debug)]
pub enum AggregatorError {
    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Sink error: {0}")]
    SinkError(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Processing error: {0}")]
    ProcessingError(String),

    #[error("Join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),

    #[error("Event error: {0}")]
    EventError(String),
}

pub type AggregatorResult<T> = Result<T, AggregatorError>;

impl From<tokio::sync::broadcast::error::SendError<BroadcastMessage>> for AggregatorError {
    fn from(err: tokio::sync::broadcast::error::SendError<BroadcastMessage>) -> Self {
        AggregatorError::EventError(err.to_string())
    }
}

impl ResponseError for AggregatorError {}
