use crate::core::domain::attack::AttackEvent;
use crate::core::ports::source::{AttackSourcePort, AttackStream};
use crate::utils::error::AggregatorResult;
use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Country codes the synthetic feed draws from.
const COUNTRIES: [&str; 10] = ["US", "CN", "RU", "IN", "DE", "BR", "FR", "GB", "JP", "AU"];

/// A synthetic attack source emitting one random event per interval.
///
/// Stands in for a real sensor feed during development and demos. Source and
/// destination are drawn from a fixed country pool; the destination is
/// re-rolled when it collides with the source so every event crosses a border.
pub struct RandomAttackGenerator {
    interval: Duration,
}

impl RandomAttackGenerator {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    fn random_event() -> AttackEvent {
        let mut rng = rand::rng();
        let source = COUNTRIES[rng.random_range(0..COUNTRIES.len())];
        let mut destination = COUNTRIES[rng.random_range(0..COUNTRIES.len())];
        while destination == source {
            destination = COUNTRIES[rng.random_range(0..COUNTRIES.len())];
        }

        AttackEvent::new(
            source,
            destination,
            Utc::now(),
            rng.random_range(0..99_999),
            rng.random_range(500..5_500),
        )
    }
}

#[async_trait]
impl AttackSourcePort for RandomAttackGenerator {
    async fn stream_attacks(
        &self,
        cancel_token: CancellationToken,
    ) -> AggregatorResult<AttackStream> {
        let interval = self.interval;
        let stream = futures_util::stream::unfold((), move |()| {
            let cancel = cancel_token.clone();
            async move {
                tokio::select! {
                    _ = cancel.cancelled() => None,
                    _ = tokio::time::sleep(interval) => {
                        Some((Ok(Self::random_event()), ()))
                    }
                }
            }
        });
        Ok(Box::pin(stream))
    }
}
