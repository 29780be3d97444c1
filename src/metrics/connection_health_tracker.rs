use crate::metrics::{HealthCheck, HealthChecker};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

/// A tracker that monitors the health of a backend based on consecutive failures.
///
/// The `ConnectionHealthTracker` maintains an atomic counter of consecutive
/// failures and considers the backend healthy while that counter stays below
/// the configured maximum. Any success resets the counter.
#[derive(Debug, Clone)]
pub struct ConnectionHealthTracker {
    /// Failures tolerated before the backend is reported unhealthy.
    max_consecutive_failures: usize,
    consecutive_failures: Arc<AtomicUsize>,
}

impl HealthCheck for ConnectionHealthTracker {
    fn healthy(&self) -> bool {
        self.consecutive_failures.load(Ordering::Relaxed) < self.max_consecutive_failures
    }
}

impl ConnectionHealthTracker {
    /// Creates a new tracker with the failure counter initialized to zero.
    #[must_use]
    pub fn new(max_consecutive_failures: usize) -> Self {
        Self {
            max_consecutive_failures,
            consecutive_failures: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Records a failure by incrementing the consecutive failures counter.
    pub fn note_failure(&self) {
        self.consecutive_failures.fetch_add(1, Ordering::SeqCst);
    }

    /// Resets the consecutive failures counter to zero.
    pub fn note_success(&self) {
        self.consecutive_failures.store(0, Ordering::SeqCst);
    }

    /// Returns a boxed clone of this tracker as a `HealthChecker`.
    #[must_use]
    pub fn tracker(&self) -> HealthChecker {
        Box::new(self.clone())
    }

    /// Returns the maximum number of consecutive failures allowed.
    pub fn max_consecutive_failures(&self) -> usize {
        self.max_consecutive_failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_resets_the_failure_streak() {
        let tracker = ConnectionHealthTracker::new(2);
        assert!(tracker.healthy());

        tracker.note_failure();
        assert!(tracker.healthy());
        tracker.note_failure();
        assert!(!tracker.healthy());

        tracker.note_success();
        assert!(tracker.healthy());
    }
}
