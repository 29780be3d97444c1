use crate::core::domain::aggregate::AggregateRecord;
use crate::utils::error::AggregatorResult;
use async_trait::async_trait;

/// A trait defining the persistence sink for aggregate snapshots.
///
/// The sink is opaque to the flush job and may be remote. Writes are
/// best-effort: a failed `save` is reported by the caller and the snapshot is
/// discarded; there is no retry of a failed batch.
#[async_trait]
#[cfg_attr(feature = "test-helpers", mockall::automock)]
pub trait SnapshotSinkPort: Send + Sync {
    /// Persists one flush's worth of aggregate records.
    async fn save(&self, records: &[AggregateRecord]) -> AggregatorResult<()>;
}
