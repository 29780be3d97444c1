use rand::rng;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

use crate::core::domain::aggregate::{AggregateKey, AggregateRecord};
use crate::core::ports::store::AggregateStorePort;
use crate::utils::error::{AggregatorError, AggregatorResult};

use crate::metrics::connection_health_tracker::ConnectionHealthTracker;
use crate::metrics::{HealthCheck, HealthChecker};

/// A health tracking adapter that wraps an inner aggregate store and monitors
/// its health using a `ConnectionHealthTracker`.
///
/// Write-path operations (`increment`) and read-path operations used by the
/// flush job (`snapshot`, `evict_expired`, `drain_and_clear`) are executed
/// with bounded retries; each attempt feeds the health tracker, which the
/// `/health` endpoint reports. A backend that keeps failing makes the service
/// report unhealthy without crashing the ingestion task.
#[derive(Clone)]
pub struct HealthTrackingAdapter<T: ?Sized> {
    adapter: Arc<T>,
    health_tracker: Arc<ConnectionHealthTracker>,
}

impl<T: ?Sized> HealthTrackingAdapter<T> {
    /// Creates a new `HealthTrackingAdapter` wrapping the provided store.
    ///
    /// # Arguments
    ///
    /// * `adapter` - An `Arc` to an instance that implements `AggregateStorePort`.
    /// * `unhealthy_after_n_errors` - The maximum number of consecutive errors allowed before
    ///   marking the service as unhealthy.
    pub fn new(adapter: Arc<T>, unhealthy_after_n_errors: usize) -> Self {
        Self {
            adapter,
            health_tracker: Arc::new(ConnectionHealthTracker::new(unhealthy_after_n_errors)),
        }
    }

    /// Returns a health checker that can be used to inspect the current health of the store.
    #[must_use]
    pub fn connection_health_checker(&self) -> HealthChecker {
        self.health_tracker.tracker()
    }

    /// Checks whether the underlying store is currently considered healthy.
    pub fn is_healthy(&self) -> bool {
        self.health_tracker.healthy()
    }

    /// Executes an operation with bounded retries and health accounting.
    ///
    /// Attempts the operation up to the tracker's failure threshold, with
    /// exponential backoff and jitter between attempts. Delays are in
    /// milliseconds: increments sit on the ingestion hot path, so a transient
    /// blip must not stall the event stream for whole seconds.
    pub async fn execute_with_health_retries<F, Fut, R>(
        &self,
        operation: F,
        op_name: &str,
    ) -> AggregatorResult<R>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = AggregatorResult<R>> + Send,
    {
        let max_attempts = self.health_tracker.max_consecutive_failures().max(1);
        let base_delay_ms = 50u64;
        let mut last_error: Option<AggregatorError> = None;

        for attempt in 1..=max_attempts {
            let result = operation().await;

            match &result {
                Ok(_) => self.health_tracker.note_success(),
                Err(_) => self.health_tracker.note_failure(),
            }

            match result {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(
                        "Health tracker: Failed to execute '{}' on attempt {}/{} with error: {}",
                        op_name, attempt, max_attempts, e
                    );
                    last_error = Some(e);
                }
            }

            let jitter: f64 = rng().random_range(0.5..1.5);
            let delay_ms =
                ((base_delay_ms * 2_u64.pow((attempt - 1) as u32)) as f64 * jitter).min(2_000.0);
            sleep(Duration::from_millis(delay_ms as u64)).await;
        }

        Err(AggregatorError::StoreError(format!(
            "{} failed after {} attempts: {}",
            op_name,
            max_attempts,
            last_error.expect("at least one attempt ran")
        )))
    }
}

#[async_trait::async_trait]
impl<T: AggregateStorePort + Send + Sync> AggregateStorePort for HealthTrackingAdapter<T> {
    async fn increment(&self, key: AggregateKey) -> AggregatorResult<AggregateRecord> {
        self.execute_with_health_retries(|| self.adapter.increment(key.clone()), "increment")
            .await
    }

    async fn snapshot(&self) -> AggregatorResult<Vec<AggregateRecord>> {
        self.execute_with_health_retries(|| self.adapter.snapshot(), "snapshot")
            .await
    }

    async fn evict_expired(&self) -> AggregatorResult<usize> {
        self.execute_with_health_retries(|| self.adapter.evict_expired(), "evict_expired")
            .await
    }

    async fn drain_and_clear(&self) -> AggregatorResult<Vec<AggregateRecord>> {
        self.execute_with_health_retries(|| self.adapter.drain_and_clear(), "drain_and_clear")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails the first `failures` calls, then succeeds.
    struct FlakyStore {
        failures: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AggregateStorePort for FlakyStore {
        async fn increment(&self, key: AggregateKey) -> AggregatorResult<AggregateRecord> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(AggregatorError::StoreError("backend unavailable".into()))
            } else {
                Ok(AggregateRecord::first(
                    key,
                    chrono::Utc::now(),
                    chrono::Duration::seconds(180),
                ))
            }
        }

        async fn snapshot(&self) -> AggregatorResult<Vec<AggregateRecord>> {
            Ok(vec![])
        }

        async fn evict_expired(&self) -> AggregatorResult<usize> {
            Ok(0)
        }

        async fn drain_and_clear(&self) -> AggregatorResult<Vec<AggregateRecord>> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn transient_failures_are_retried_until_success() {
        let store = Arc::new(FlakyStore {
            failures: 2,
            calls: AtomicUsize::new(0),
        });
        let adapter = HealthTrackingAdapter::new(store, 3);

        let record = adapter.increment(AggregateKey::new("US", "CN")).await.unwrap();
        assert_eq!(record.count, 1);
        assert!(adapter.is_healthy());
    }

    #[tokio::test]
    async fn exhausted_retries_surface_a_store_error_and_unhealthy_state() {
        let store = Arc::new(FlakyStore {
            failures: usize::MAX,
            calls: AtomicUsize::new(0),
        });
        let adapter = HealthTrackingAdapter::new(store, 2);

        let result = adapter.increment(AggregateKey::new("US", "CN")).await;
        assert!(matches!(result, Err(AggregatorError::StoreError(_))));
        assert!(!adapter.is_healthy());
    }
}
