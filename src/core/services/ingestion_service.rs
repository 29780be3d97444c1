use crate::core::domain::aggregate::AggregateKey;
use crate::core::ports::runner::Runner;
use crate::core::ports::source::AttackSourcePort;
use crate::core::ports::store::AggregateStorePort;
use crate::messaging::{BroadcastMessage, Publisher};
use crate::utils::error::AggregatorResult;
use futures_util::StreamExt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// The `IngestionService` pulls attack events from the configured source,
/// counts them in the aggregate store, and publishes each event on the bus.
///
/// The counter update always lands before the publish: a subscriber that
/// reacts to an attack message by querying a snapshot sees at least its own
/// event reflected. An event whose store update fails (after the store
/// adapter's bounded retries) is dropped with a log line; it is neither
/// published nor allowed to crash the ingestion task.
pub struct IngestionService {
    /// Where raw events come from.
    source: Arc<dyn AttackSourcePort>,
    /// The aggregate store being fed.
    store: Arc<dyn AggregateStorePort>,
    /// The bus attacks are announced on.
    publisher: Arc<Publisher>,
    cancel_token: CancellationToken,
}

impl IngestionService {
    pub fn new(
        source: Arc<dyn AttackSourcePort>,
        store: Arc<dyn AggregateStorePort>,
        publisher: Arc<Publisher>,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            source,
            store,
            publisher,
            cancel_token,
        }
    }
}

#[async_trait::async_trait]
impl Runner for IngestionService {
    /// Runs the ingestion loop until the source ends or shutdown is requested.
    async fn run(&mut self) -> AggregatorResult<()> {
        let stream = self.source.stream_attacks(self.cancel_token.clone()).await?;
        futures_util::pin_mut!(stream);

        while let Some(item) = tokio::select! {
            item = stream.next() => item,
            _ = self.cancel_token.cancelled() => {
                info!("Ingestion cancelled. Shutting down gracefully.");
                None
            }
        } {
            match item {
                Ok(event) => {
                    let key = AggregateKey::new(event.source.clone(), event.destination.clone());
                    if let Err(e) = self.store.increment(key).await {
                        error!("Dropping event after failed store update: {}", e);
                        continue;
                    }
                    if let Err(e) = self.publisher.publish(BroadcastMessage::Attack { event }) {
                        // No subscriber registered right now; the count above
                        // still stands.
                        tracing::debug!("Attack message not delivered: {}", e);
                    }
                }
                Err(e) => {
                    error!("Error reading attack source: {}. Skipping event.", e);
                    continue;
                }
            }
        }

        Ok(())
    }
}
