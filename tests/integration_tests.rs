// Note: This test suite uses in-process dummies for the attack source and,
// where convenient, the aggregate store. Driving a real WebSocket client
// against a bound server would need extra harness setup; the fan-out path is
// exercised directly through the manager's subscriber streams instead, which
// is the same code the WebSocket actor drains.

use actix_web::{test, web, App};
use async_trait::async_trait;
use attack_data_aggregator::{
    adapters::api::handlers::aggregates::get_aggregates,
    adapters::api::server::ApiState,
    adapters::storage::memory_store::MemoryAggregateStore,
    core::{
        domain::aggregate::{AggregateKey, AggregateRecord},
        domain::attack::AttackEvent,
        ports::runner::Runner,
        ports::source::{AttackSourcePort, AttackStream},
        ports::store::AggregateStorePort,
    },
    core::services::ingestion_service::IngestionService,
    messaging::fanout::FanoutManager,
    messaging::{BroadcastMessage, Publisher},
    utils::error::AggregatorResult,
};
use chrono::{Duration as ChronoDuration, Utc};
use futures::StreamExt;
use futures_util::stream;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

struct DummyStore;

#[async_trait]
impl AggregateStorePort for DummyStore {
    async fn increment(&self, key: AggregateKey) -> AggregatorResult<AggregateRecord> {
        Ok(AggregateRecord::first(
            key,
            Utc::now(),
            ChronoDuration::seconds(180),
        ))
    }

    async fn snapshot(&self) -> AggregatorResult<Vec<AggregateRecord>> {
        let now = Utc::now();
        let ttl = ChronoDuration::seconds(180);
        let mut quiet = AggregateRecord::first(AggregateKey::new("RU", "DE"), now, ttl);
        quiet.count = 2;
        let mut busy = AggregateRecord::first(AggregateKey::new("US", "CN"), now, ttl);
        busy.count = 7;
        Ok(vec![quiet, busy])
    }

    async fn evict_expired(&self) -> AggregatorResult<usize> {
        Ok(0)
    }

    async fn drain_and_clear(&self) -> AggregatorResult<Vec<AggregateRecord>> {
        Ok(vec![])
    }
}

struct FixedSource {
    events: Vec<AttackEvent>,
}

#[async_trait]
impl AttackSourcePort for FixedSource {
    async fn stream_attacks(
        &self,
        _cancel_token: CancellationToken,
    ) -> AggregatorResult<AttackStream> {
        let items: Vec<AggregatorResult<AttackEvent>> =
            self.events.iter().cloned().map(Ok).collect();
        Ok(Box::pin(stream::iter(items)))
    }
}

fn init_app_state() -> Arc<ApiState> {
    Arc::new(ApiState {
        store: Arc::new(DummyStore),
    })
}

#[actix_web::test]
async fn test_get_aggregates_endpoint() {
    let state = init_app_state();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .service(get_aggregates),
    )
    .await;

    let req = test::TestRequest::get().uri("/aggregates").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::OK);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"].as_str().unwrap(), "success");

    let records = body["data"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    // Busiest pair first.
    assert_eq!(records[0]["key"]["source"].as_str().unwrap(), "US");
    assert_eq!(records[0]["count"].as_u64().unwrap(), 7);
    assert_eq!(records[1]["count"].as_u64().unwrap(), 2);
}

#[actix_web::test]
async fn test_ingested_events_reach_an_attached_subscriber() {
    let store = Arc::new(MemoryAggregateStore::new(Duration::from_secs(180)));
    let publisher = Arc::new(Publisher::new(64));
    let fanout = FanoutManager::new(publisher.clone(), 16);
    let shutdown = CancellationToken::new();
    let mut subscriber = fanout.attach(&shutdown);

    let source = Arc::new(FixedSource {
        events: vec![
            AttackEvent::new("US", "CN", Utc::now(), 13335, 900),
            AttackEvent::new("US", "CN", Utc::now(), 13335, 1100),
            AttackEvent::new("RU", "DE", Utc::now(), 3320, 700),
        ],
    });
    let mut ingestion = IngestionService::new(
        source,
        store.clone(),
        publisher.clone(),
        shutdown.clone(),
    );
    ingestion.run().await.unwrap();

    // The subscriber observes every event, in publication order, and the
    // store already reflects each event by the time it is announced.
    for expected in ["US", "US", "RU"] {
        let message = tokio::time::timeout(Duration::from_secs(1), subscriber.next())
            .await
            .expect("subscriber starved")
            .expect("stream ended early");
        match message {
            BroadcastMessage::Attack { event } => assert_eq!(event.source, expected),
            other => panic!("unexpected message: {:?}", other),
        }
    }

    let mut snapshot = store.snapshot().await.unwrap();
    snapshot.sort_by(|a, b| a.key.source.cmp(&b.key.source));
    assert_eq!(snapshot[0].count, 1);
    assert_eq!(snapshot[1].count, 2);

    // Shutdown tears the subscription down and ends the stream.
    shutdown.cancel();
    assert!(
        tokio::time::timeout(Duration::from_secs(1), subscriber.next())
            .await
            .expect("stream did not observe cancellation")
            .is_none()
    );
    for _ in 0..100 {
        if fanout.active_subscribers() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(fanout.active_subscribers(), 0);
}
