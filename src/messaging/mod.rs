pub mod event_listener;
pub mod fanout;

use crate::core::domain::aggregate::AggregateRecord;
use crate::core::domain::attack::AttackEvent;
use crate::utils::error::AggregatorResult;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// A message carried by the broadcast bus.
///
/// Only the ingestion path and the flush job construct these; only the fan-out
/// side consumes them. The bus itself treats them as opaque payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BroadcastMessage {
    /// One raw event, published after its counter update has landed.
    Attack { event: AttackEvent },
    /// A snapshot of the live aggregate records, published on each flush.
    Summary { records: Vec<AggregateRecord> },
}

/// A publish/subscribe bus based on Tokio's broadcast channel.
///
/// The `Publisher` decouples producers from an unknown number of subscribers:
/// `publish` never blocks, each subscriber gets its own copy of every message
/// published after it subscribed, and per-producer order is preserved per
/// subscriber. The channel keeps a bounded ring of recent messages; a
/// subscriber that falls behind observes `RecvError::Lagged(n)` and loses the
/// `n` oldest messages it had not yet consumed, without affecting anyone else.
#[derive(Clone)]
pub struct Publisher {
    sender: broadcast::Sender<BroadcastMessage>,
}

impl Publisher {
    /// Creates a new `Publisher` with the given ring capacity.
    ///
    /// The capacity bounds how many undelivered messages a lagging subscriber
    /// can be owed before the oldest are dropped for it.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes a message to all current subscribers.
    ///
    /// Returns the number of subscribers the message was delivered to. Sending
    /// while no subscriber is registered is an error at the channel level and
    /// is surfaced as such; callers on the ingestion path log and move on.
    pub fn publish(&self, message: BroadcastMessage) -> AggregatorResult<usize> {
        self.sender.send(message).map_err(|e| e.into())
    }

    /// Returns a new receiver subscribed to the message stream.
    ///
    /// Registration is effective immediately: every message published after
    /// this call returns is visible to the receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastMessage> {
        self.sender.subscribe()
    }

    /// The number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
