use crate::messaging::{BroadcastMessage, Publisher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::select;
use tokio::sync::broadcast::Receiver;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Statistics tracking for the event listener.
/// Keeps count of observed attacks and flushed summaries.
#[derive(Default)]
struct ListenerStats {
    /// Counter for attack messages seen on the bus
    attacks_observed: AtomicUsize,
    /// Counter for summary messages seen on the bus
    summaries_flushed: AtomicUsize,
}

/// A bus subscriber that keeps operational counters for the message stream.
///
/// The listener is a plain subscriber like any connection: it observes the
/// same attack and summary messages the fan-out side delivers, which makes its
/// counters a cheap sanity check on the whole pipeline.
#[derive(Default)]
pub struct EventListener {
    stats: Arc<ListenerStats>,
}

impl EventListener {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(ListenerStats::default()),
        }
    }

    /// Retrieves the current counters.
    ///
    /// # Returns
    /// A tuple containing:
    /// - Number of attacks observed
    /// - Number of summaries flushed
    pub fn get_stats(&self) -> (usize, usize) {
        (
            self.stats.attacks_observed.load(Ordering::Relaxed),
            self.stats.summaries_flushed.load(Ordering::Relaxed),
        )
    }
}

/// Runs the event listener loop, counting bus messages until shutdown.
///
/// Lagging behind the bus is tolerated: the listener resubscribes and keeps
/// counting from the current position rather than terminating.
pub async fn run_event_listener(
    publisher: Arc<Publisher>,
    cancel_token: CancellationToken,
    listener: Arc<EventListener>,
) {
    let mut receiver: Receiver<BroadcastMessage> = publisher.subscribe();

    info!("Event listener started");

    loop {
        select! {
            result = receiver.recv() => {
                match result {
                    Ok(message) => {
                        match message {
                            BroadcastMessage::Attack { .. } => {
                                listener.stats.attacks_observed.fetch_add(1, Ordering::Relaxed);
                            }
                            BroadcastMessage::Summary { .. } => {
                                listener.stats.summaries_flushed.fetch_add(1, Ordering::Relaxed);
                            }
                        }
                    }
                    Err(e) => {
                        warn!("Error receiving message: {}", e);
                        if e.to_string().contains("lagged") {
                            receiver = publisher.subscribe();
                            continue;
                        }
                        break;
                    }
                }
            }
            _ = cancel_token.cancelled() => {
                info!("Event listener cancelled gracefully");
                break;
            }
        }
    }

    let (attacks, summaries) = listener.get_stats();
    info!(
        "Event listener shutting down. Observed {} attacks, {} summary flushes",
        attacks, summaries
    );
}
