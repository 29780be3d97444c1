use crate::core::domain::aggregate::{AggregateKey, AggregateRecord};
use crate::utils::error::AggregatorResult;
use async_trait::async_trait;

/// A trait defining the windowed aggregation store.
///
/// The `AggregateStorePort` trait abstracts the backend that keeps one counter
/// record per `(source, destination)` pair, each with a TTL window. It is
/// implemented by the in-memory store and could be backed by an external
/// key-value service with the same contract.
///
/// Implementations must serialize read-modify-write on a given key: two
/// concurrent `increment` calls for the same key must both be counted.
/// No read path may ever return a record whose window has expired.
///
/// The trait is annotated with `#[cfg_attr(feature = "test-helpers", mockall::automock)]`
/// to allow automatic generation of mock implementations for testing purposes.
#[async_trait]
#[cfg_attr(feature = "test-helpers", mockall::automock)]
pub trait AggregateStorePort: Send + Sync {
    /// Counts one event for `key`.
    ///
    /// Creates a record with `count = 1` if no live record exists (an expired
    /// record counts as absent), otherwise increments the count and refreshes
    /// the `last_seen`/`expires_at` window. Returns the record as written.
    async fn increment(&self, key: AggregateKey) -> AggregatorResult<AggregateRecord>;

    /// Returns every live (non-expired) record. Entries are left intact for
    /// continued counting.
    async fn snapshot(&self) -> AggregatorResult<Vec<AggregateRecord>>;

    /// Removes every record whose window has closed; returns how many were
    /// evicted.
    async fn evict_expired(&self) -> AggregatorResult<usize>;

    /// Atomically takes a snapshot of the live records and removes them.
    ///
    /// This is the alternative flush policy: counts reported through it mean
    /// "events since the last drain", not "events in the last TTL window".
    async fn drain_and_clear(&self) -> AggregatorResult<Vec<AggregateRecord>>;
}
