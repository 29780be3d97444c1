use crate::core::ports::runner::Runner;
use crate::core::ports::sink::SnapshotSinkPort;
use crate::core::ports::store::AggregateStorePort;
use crate::messaging::{BroadcastMessage, Publisher};
use crate::utils::error::AggregatorResult;
use std::sync::Arc;
use tracing::{debug, error};

/// The `FlushService` periodically snapshots the aggregate store, publishes
/// the result as a summary, and hands it to the persistence sink.
///
/// Records are left intact by the flush: a summary reports the counts of the
/// last TTL window, so a burst straddling two flush ticks is never
/// undercounted. Deployments that want "counts since last flush" semantics
/// can swap `snapshot` for `drain_and_clear` here.
///
/// Sink writes are best-effort. A failed save is logged and its snapshot
/// discarded; the next tick reports then-current data.
pub struct FlushService {
    store: Arc<dyn AggregateStorePort>,
    publisher: Arc<Publisher>,
    sink: Option<Arc<dyn SnapshotSinkPort>>,
}

impl FlushService {
    pub fn new(
        store: Arc<dyn AggregateStorePort>,
        publisher: Arc<Publisher>,
        sink: Option<Arc<dyn SnapshotSinkPort>>,
    ) -> Self {
        Self {
            store,
            publisher,
            sink,
        }
    }
}

#[async_trait::async_trait]
impl Runner for FlushService {
    async fn run(&mut self) -> AggregatorResult<()> {
        // Sweep first so dead keys never survive more than one tick.
        let evicted = self.store.evict_expired().await?;
        if evicted > 0 {
            debug!("Evicted {} expired aggregate records", evicted);
        }

        let records = self.store.snapshot().await?;
        debug!("Flushing {} live aggregate records", records.len());

        if let Err(e) = self
            .publisher
            .publish(BroadcastMessage::Summary {
                records: records.clone(),
            })
        {
            tracing::debug!("Summary not delivered: {}", e);
        }

        if let Some(sink) = &self.sink {
            if let Err(e) = sink.save(&records).await {
                error!("Failed to persist aggregate snapshot: {}", e);
            }
        }

        Ok(())
    }
}
