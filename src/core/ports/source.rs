use crate::core::domain::attack::AttackEvent;
use crate::utils::error::AggregatorResult;
use async_trait::async_trait;
use futures_util::Stream;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

pub type AttackStream = Pin<Box<dyn Stream<Item = AggregatorResult<AttackEvent>> + Send>>;

/// A trait defining where attack events come from.
///
/// The `AttackSourcePort` trait abstracts the producer of raw events: the
/// bundled random generator, a network sensor, a message queue consumer.
/// The core assumes nothing about the source beyond per-source ordering of
/// the yielded events.
#[async_trait]
#[cfg_attr(feature = "test-helpers", mockall::automock)]
pub trait AttackSourcePort: Send + Sync {
    /// Opens the event stream.
    ///
    /// The stream may be infinite; it must end promptly once `cancel_token`
    /// is triggered. Individual items may be errors (a malformed reading, a
    /// transient sensor failure) without terminating the stream.
    async fn stream_attacks(&self, cancel_token: CancellationToken)
        -> AggregatorResult<AttackStream>;
}
