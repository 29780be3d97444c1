use crate::adapters::health_tracking_adapter::HealthTrackingAdapter;
use crate::adapters::storage::memory_store::MemoryAggregateStore;
use crate::config::Config;
use crate::core::ports::sink::SnapshotSinkPort;
use crate::core::ports::source::AttackSourcePort;
use crate::core::services::flush_service::FlushService;
use crate::core::services::ingestion_service::IngestionService;
use crate::messaging::event_listener::{run_event_listener, EventListener};
use crate::messaging::Publisher;
use crate::utils::scheduler::schedule_polling;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub fn setup_ingestion_service(
    config: &Config,
    source: Arc<dyn AttackSourcePort>,
    store: Arc<HealthTrackingAdapter<MemoryAggregateStore>>,
    publisher: Arc<Publisher>,
    cancel_token: CancellationToken,
) -> JoinHandle<()> {
    let ingestion_service =
        IngestionService::new(source, store, publisher, cancel_token.clone());

    // The source stream is long-lived; the interval only paces re-opening it
    // after an error or source exhaustion.
    schedule_polling(
        config.generator.interval,
        ingestion_service,
        "IngestionService",
        cancel_token,
    )
}

pub fn setup_flush_service(
    config: &Config,
    store: Arc<HealthTrackingAdapter<MemoryAggregateStore>>,
    publisher: Arc<Publisher>,
    sink: Option<Arc<dyn SnapshotSinkPort>>,
    cancel_token: CancellationToken,
) -> JoinHandle<()> {
    let flush_service = FlushService::new(store, publisher, sink);

    schedule_polling(
        config.flush.interval,
        flush_service,
        "FlushService",
        cancel_token,
    )
}

pub fn spawn_event_listener(
    publisher: Arc<Publisher>,
    cancel_token: CancellationToken,
    event_listener: Arc<EventListener>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        run_event_listener(publisher, cancel_token, event_listener).await;
    })
}
