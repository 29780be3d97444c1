use crate::metrics::{HealthCheck, HealthChecker, HealthReport, HealthReporting};
use std::sync::Arc;

/// A service that aggregates health information from the store adapter.
///
/// The `HealthReporterService` wraps a `HealthChecker` and implements both the
/// `HealthCheck` and `HealthReporting` traits. It backs the `/health`
/// endpoint: the service is healthy exactly while the aggregate store keeps
/// accepting operations.
pub struct HealthReporterService {
    aggregate_store: HealthChecker,
}

impl HealthReporterService {
    #[must_use]
    pub fn new(aggregate_store: HealthChecker) -> Arc<Self> {
        Arc::new(Self { aggregate_store })
    }
}

impl HealthCheck for HealthReporterService {
    fn healthy(&self) -> bool {
        self.aggregate_store.healthy()
    }
}

impl HealthReporting for HealthReporterService {
    #[must_use]
    fn report(&self) -> HealthReport {
        HealthReport {
            aggregate_store: self.aggregate_store.healthy(),
        }
    }
}
