mod setup;

use crate::adapters::api::server::launch_api_server;
use crate::adapters::generator::RandomAttackGenerator;
use crate::adapters::health_tracking_adapter::HealthTrackingAdapter;
use crate::adapters::sink::jsonl_sink::JsonlSnapshotSink;
use crate::adapters::storage::memory_store::MemoryAggregateStore;
use crate::config::Config;
use crate::core::ports::sink::SnapshotSinkPort;
use crate::core::services::health_reporter_service::HealthReporterService;
use crate::messaging::event_listener::EventListener;
use crate::messaging::fanout::FanoutManager;
use crate::messaging::Publisher;
use crate::utils::error::AggregatorResult;
use crate::utils::logger;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::error;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct BootstrapArgs {
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

pub async fn run_bootstrap() -> AggregatorResult<()> {
    logger::init();

    let cancel_token = CancellationToken::new();
    let args = BootstrapArgs::parse();

    let config = match Config::new(args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Config error: {}", e);
            std::process::exit(1);
        }
    };
    config.validate()?;

    let store = Arc::new(MemoryAggregateStore::new(config.aggregation.ttl));
    let health_tracking_store = Arc::new(HealthTrackingAdapter::new(
        store,
        config.aggregation.max_retry_attempts,
    ));

    let sink: Option<Arc<dyn SnapshotSinkPort>> = match &config.flush.sink_path {
        Some(path) => Some(Arc::new(JsonlSnapshotSink::new(path.clone())?)),
        None => None,
    };

    let publisher = Arc::new(Publisher::new(config.fanout.bus_capacity));
    let generator = Arc::new(RandomAttackGenerator::new(config.generator.interval));

    let mut process_handles = vec![];

    let event_listener = Arc::new(EventListener::new());
    let event_listener_handle = setup::spawn_event_listener(
        publisher.clone(),
        cancel_token.clone(),
        event_listener.clone(),
    );
    process_handles.push(event_listener_handle);

    process_handles.push(setup::setup_ingestion_service(
        &config,
        generator,
        health_tracking_store.clone(),
        publisher.clone(),
        cancel_token.clone(),
    ));

    process_handles.push(setup::setup_flush_service(
        &config,
        health_tracking_store.clone(),
        publisher.clone(),
        sink,
        cancel_token.clone(),
    ));

    let health_reporter =
        HealthReporterService::new(health_tracking_store.connection_health_checker());

    let fanout = FanoutManager::new(publisher.clone(), config.fanout.queue_depth);

    launch_api_server(
        config.server.host,
        config.server.port,
        health_tracking_store,
        health_reporter,
        fanout,
        cancel_token.clone(),
    )
    .await?;

    shut_down(cancel_token, process_handles).await
}

pub async fn shut_down(
    cancel_token: CancellationToken,
    handles: Vec<JoinHandle<()>>,
) -> AggregatorResult<()> {
    cancel_token.cancel();

    for handle in handles {
        handle.await?;
    }

    Ok(())
}
