use crate::core::domain::aggregate::{AggregateKey, AggregateRecord};
use crate::core::ports::store::AggregateStorePort;
use crate::utils::error::AggregatorResult;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// An in-memory aggregate store.
///
/// This adapter implements the `AggregateStorePort` trait using a `HashMap`
/// wrapped in an asynchronous RwLock, keyed by the `(source, destination)`
/// pair. Every read-modify-write happens under the write lock, so concurrent
/// increments on the same key are serialized and none is lost.
///
/// Expiry is enforced lazily: an expired entry counts as absent for
/// `increment`, is filtered out of `snapshot`, and is physically removed by
/// `evict_expired` (the flush job sweeps on every tick).
#[derive(Clone)]
pub struct MemoryAggregateStore {
    records: Arc<RwLock<HashMap<AggregateKey, AggregateRecord>>>,
    ttl: Duration,
}

impl MemoryAggregateStore {
    /// Creates a new store whose records live for `ttl` past their last event.
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::seconds(180)),
        }
    }
}

#[async_trait]
impl AggregateStorePort for MemoryAggregateStore {
    async fn increment(&self, key: AggregateKey) -> AggregatorResult<AggregateRecord> {
        let now = Utc::now();
        let mut map = self.records.write().await;
        let record = map
            .entry(key.clone())
            .and_modify(|record| {
                if record.is_expired(now) {
                    // The previous window closed; this event opens a new one.
                    *record = AggregateRecord::first(key.clone(), now, self.ttl);
                } else {
                    record.observe(now, self.ttl);
                }
            })
            .or_insert_with(|| AggregateRecord::first(key, now, self.ttl));
        Ok(record.clone())
    }

    async fn snapshot(&self) -> AggregatorResult<Vec<AggregateRecord>> {
        let now = Utc::now();
        let map = self.records.read().await;
        Ok(map
            .values()
            .filter(|record| !record.is_expired(now))
            .cloned()
            .collect())
    }

    async fn evict_expired(&self) -> AggregatorResult<usize> {
        let now = Utc::now();
        let mut map = self.records.write().await;
        let before = map.len();
        map.retain(|_, record| !record.is_expired(now));
        Ok(before - map.len())
    }

    async fn drain_and_clear(&self) -> AggregatorResult<Vec<AggregateRecord>> {
        let now = Utc::now();
        let mut map = self.records.write().await;
        Ok(map
            .drain()
            .map(|(_, record)| record)
            .filter(|record| !record.is_expired(now))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    fn key(source: &str, destination: &str) -> AggregateKey {
        AggregateKey::new(source, destination)
    }

    #[tokio::test]
    async fn three_increments_yield_one_record_with_count_three() {
        let store = MemoryAggregateStore::new(StdDuration::from_secs(180));
        for _ in 0..3 {
            store.increment(key("US", "CN")).await.unwrap();
        }

        let snapshot = store.snapshot().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].key, key("US", "CN"));
        assert_eq!(snapshot[0].count, 3);
    }

    #[tokio::test]
    async fn distinct_pairs_are_distinct_counters() {
        let store = MemoryAggregateStore::new(StdDuration::from_secs(180));
        store.increment(key("US", "CN")).await.unwrap();
        store.increment(key("CN", "US")).await.unwrap();
        store.increment(key("US", "CN")).await.unwrap();

        let mut snapshot = store.snapshot().await.unwrap();
        snapshot.sort_by(|a, b| a.key.source.cmp(&b.key.source));
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].count, 1);
        assert_eq!(snapshot[1].count, 2);
    }

    #[tokio::test]
    async fn concurrent_increments_on_one_key_are_all_counted() {
        let store = Arc::new(MemoryAggregateStore::new(StdDuration::from_secs(180)));
        let tasks: Vec<_> = (0..100)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.increment(key("US", "CN")).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let snapshot = store.snapshot().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].count, 100);
    }

    #[tokio::test]
    async fn expired_records_never_appear_in_a_snapshot() {
        let store = MemoryAggregateStore::new(StdDuration::from_millis(40));
        store.increment(key("US", "CN")).await.unwrap();
        assert_eq!(store.snapshot().await.unwrap().len(), 1);

        tokio::time::sleep(StdDuration::from_millis(80)).await;
        assert!(store.snapshot().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn increment_on_an_expired_record_restarts_the_window() {
        let store = MemoryAggregateStore::new(StdDuration::from_millis(40));
        store.increment(key("US", "CN")).await.unwrap();
        store.increment(key("US", "CN")).await.unwrap();

        tokio::time::sleep(StdDuration::from_millis(80)).await;
        let record = store.increment(key("US", "CN")).await.unwrap();
        assert_eq!(record.count, 1, "stale window must not leak its count");
    }

    #[tokio::test]
    async fn evict_expired_removes_only_closed_windows() {
        let store = MemoryAggregateStore::new(StdDuration::from_millis(60));
        store.increment(key("US", "CN")).await.unwrap();
        tokio::time::sleep(StdDuration::from_millis(90)).await;
        store.increment(key("RU", "DE")).await.unwrap();

        let evicted = store.evict_expired().await.unwrap();
        assert_eq!(evicted, 1);

        let snapshot = store.snapshot().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].key, key("RU", "DE"));
    }

    #[tokio::test]
    async fn drain_and_clear_empties_the_store() {
        let store = MemoryAggregateStore::new(StdDuration::from_secs(180));
        store.increment(key("US", "CN")).await.unwrap();
        store.increment(key("RU", "DE")).await.unwrap();

        let drained = store.drain_and_clear().await.unwrap();
        assert_eq!(drained.len(), 2);
        assert!(store.snapshot().await.unwrap().is_empty());

        // Counting starts over afterwards.
        let record = store.increment(key("US", "CN")).await.unwrap();
        assert_eq!(record.count, 1);
    }
}
