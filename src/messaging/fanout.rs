use crate::messaging::{BroadcastMessage, Publisher};
use futures::Stream;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Lifecycle of one subscriber connection. There is no transition out of
/// `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionState {
    Attached,
    Streaming,
    Closing,
    Closed,
}

/// Bridges the push-based broadcast bus to one pull-based output stream per
/// connection.
///
/// Each `attach` call registers a bus subscription and spawns a relay task
/// that moves messages into a bounded per-connection queue. The relay races
/// bus delivery against the connection's cancellation signal, so teardown is
/// prompt even mid-delivery. A consumer that stops draining its queue parks
/// the relay on the queue; the bus ring then sheds the oldest undelivered
/// messages for that subscriber only, and the publisher is never blocked.
#[derive(Clone)]
pub struct FanoutManager {
    publisher: Arc<Publisher>,
    queue_depth: usize,
    active: Arc<AtomicUsize>,
}

impl FanoutManager {
    /// Creates a manager relaying from `publisher` with the given
    /// per-connection queue depth.
    pub fn new(publisher: Arc<Publisher>, queue_depth: usize) -> Self {
        Self {
            publisher,
            queue_depth: queue_depth.max(1),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The number of connections currently attached (streaming or closing).
    pub fn active_subscribers(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Registers a new subscriber connection and returns its output stream.
    ///
    /// The bus subscription is taken before this call returns, so every
    /// message published afterwards is visible to the connection. The stream
    /// is lazy, unbounded, and non-restartable: it yields until
    /// `cancel_token` (or the child token held by the stream) fires, then
    /// ends. Dropping the stream tears the connection down as well.
    pub fn attach(&self, cancel_token: &CancellationToken) -> SubscriberStream {
        let cancel_token = cancel_token.child_token();
        let receiver = self.publisher.subscribe();
        let (tx, out_rx) = mpsc::channel(self.queue_depth);

        self.active.fetch_add(1, Ordering::SeqCst);
        tokio::spawn(relay(receiver, tx, cancel_token.clone(), self.active.clone()));

        SubscriberStream {
            receiver: out_rx,
            cancel_token,
        }
    }
}

/// Moves messages from the bus into one connection's queue until the
/// connection is cancelled, the consumer goes away, or the bus closes.
async fn relay(
    mut receiver: broadcast::Receiver<BroadcastMessage>,
    tx: mpsc::Sender<BroadcastMessage>,
    cancel_token: CancellationToken,
    active: Arc<AtomicUsize>,
) {
    let mut state = ConnectionState::Attached;
    let mut dropped: u64 = 0;
    debug!(?state, "subscriber attached");

    state = ConnectionState::Streaming;
    while state == ConnectionState::Streaming {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                state = ConnectionState::Closing;
            }
            result = receiver.recv() => match result {
                Ok(message) => {
                    // Parking on a full queue stalls only this connection; the
                    // bus ring keeps absorbing publishes meanwhile and sheds
                    // our oldest messages if we stay behind.
                    tokio::select! {
                        _ = cancel_token.cancelled() => {
                            state = ConnectionState::Closing;
                        }
                        sent = tx.send(message) => {
                            if sent.is_err() {
                                state = ConnectionState::Closing;
                            }
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    dropped += n;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    state = ConnectionState::Closing;
                }
            }
        }
    }

    // Dropping the bus receiver is the unsubscribe.
    drop(receiver);
    drop(tx);
    if dropped > 0 {
        warn!(dropped, "slow subscriber shed messages before teardown");
    }
    active.fetch_sub(1, Ordering::SeqCst);
    state = ConnectionState::Closed;
    debug!(?state, "subscriber detached");
}

/// One connection's lazy output stream of bus messages.
///
/// Ends (yields `None`) once the connection's cancellation signal has fired;
/// messages still queued at that point are discarded rather than delivered.
pub struct SubscriberStream {
    receiver: mpsc::Receiver<BroadcastMessage>,
    cancel_token: CancellationToken,
}

impl Stream for SubscriberStream {
    type Item = BroadcastMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.cancel_token.is_cancelled() {
            self.receiver.close();
            return Poll::Ready(None);
        }
        self.receiver.poll_recv(cx)
    }
}

impl Drop for SubscriberStream {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::attack::AttackEvent;
    use chrono::Utc;
    use futures::StreamExt;
    use std::time::Duration;

    fn attack(source: &str) -> BroadcastMessage {
        BroadcastMessage::Attack {
            event: AttackEvent::new(source, "CN", Utc::now(), 64500, 1200),
        }
    }

    fn source_of(message: BroadcastMessage) -> String {
        match message {
            BroadcastMessage::Attack { event } => event.source,
            other => panic!("unexpected message: {:?}", other),
        }
    }

    async fn settled(fanout: &FanoutManager, expected: usize) {
        for _ in 0..100 {
            if fanout.active_subscribers() == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "subscriber count never reached {expected}, still {}",
            fanout.active_subscribers()
        );
    }

    #[tokio::test]
    async fn attached_stream_yields_published_messages_in_order() {
        let publisher = Arc::new(Publisher::new(32));
        let fanout = FanoutManager::new(publisher.clone(), 8);
        let cancel = CancellationToken::new();
        let mut stream = fanout.attach(&cancel);

        publisher.publish(attack("US")).unwrap();
        publisher.publish(attack("RU")).unwrap();

        assert_eq!(source_of(stream.next().await.unwrap()), "US");
        assert_eq!(source_of(stream.next().await.unwrap()), "RU");
    }

    #[tokio::test]
    async fn both_subscribers_receive_a_single_publish() {
        let publisher = Arc::new(Publisher::new(32));
        let fanout = FanoutManager::new(publisher.clone(), 8);
        let cancel = CancellationToken::new();
        let mut first = fanout.attach(&cancel);
        let mut second = fanout.attach(&cancel);
        settled(&fanout, 2).await;

        publisher.publish(attack("US")).unwrap();

        assert_eq!(source_of(first.next().await.unwrap()), "US");
        assert_eq!(source_of(second.next().await.unwrap()), "US");
    }

    #[tokio::test]
    async fn cancellation_ends_the_stream_and_releases_the_subscription() {
        let publisher = Arc::new(Publisher::new(32));
        let fanout = FanoutManager::new(publisher.clone(), 8);
        let cancel = CancellationToken::new();
        let mut stream = fanout.attach(&cancel);
        settled(&fanout, 1).await;
        assert_eq!(publisher.subscriber_count(), 1);

        cancel.cancel();
        assert!(stream.next().await.is_none());
        settled(&fanout, 0).await;
        assert_eq!(publisher.subscriber_count(), 0);

        // Nothing further can reach the cancelled connection.
        assert!(publisher.publish(attack("US")).is_err() || stream.next().await.is_none());
    }

    #[tokio::test]
    async fn dropping_the_stream_detaches_the_subscriber() {
        let publisher = Arc::new(Publisher::new(32));
        let fanout = FanoutManager::new(publisher.clone(), 8);
        let cancel = CancellationToken::new();
        let stream = fanout.attach(&cancel);
        settled(&fanout, 1).await;

        drop(stream);
        settled(&fanout, 0).await;
    }

    #[tokio::test]
    async fn a_stalled_subscriber_does_not_delay_an_active_one() {
        let publisher = Arc::new(Publisher::new(4));
        let fanout = FanoutManager::new(publisher.clone(), 2);
        let cancel = CancellationToken::new();
        // Never drained: its relay parks once queue and ring fill up.
        let _stalled = fanout.attach(&cancel);
        let mut active = fanout.attach(&cancel);
        settled(&fanout, 2).await;

        // Publish well past the stalled connection's combined bound. Every
        // publish must return promptly and the active subscriber must keep up.
        for i in 0..50u32 {
            publisher.publish(attack(&format!("S{i}"))).unwrap();
            let received = tokio::time::timeout(Duration::from_secs(1), active.next())
                .await
                .expect("active subscriber was starved")
                .unwrap();
            assert_eq!(source_of(received), format!("S{i}"));
        }
    }

    #[tokio::test]
    async fn a_lagged_subscriber_sheds_oldest_but_keeps_streaming() {
        let publisher = Arc::new(Publisher::new(4));
        let fanout = FanoutManager::new(publisher.clone(), 2);
        let cancel = CancellationToken::new();
        let mut stream = fanout.attach(&cancel);
        settled(&fanout, 1).await;

        for i in 0..32u32 {
            publisher.publish(attack(&format!("S{i}"))).unwrap();
        }
        // Give the relay a chance to observe the backlog.
        tokio::time::sleep(Duration::from_millis(50)).await;

        // The connection stays live and still observes the most recent
        // messages; the oldest were shed rather than buffered without bound.
        let mut seen = Vec::new();
        while let Ok(Some(message)) =
            tokio::time::timeout(Duration::from_millis(200), stream.next()).await
        {
            seen.push(source_of(message));
        }
        assert!(!seen.is_empty());
        assert!(seen.len() < 32, "backlog was buffered unbounded: {seen:?}");
        assert_eq!(seen.last().unwrap(), "S31");
    }
}
