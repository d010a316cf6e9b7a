//! Seat-change broadcasting.
//!
//! After every committed seat mutation the service publishes one
//! [`SeatChange`] per affected course. Delivery is fire-and-forget with
//! at-least-once semantics toward live subscribers and no ordering guarantee
//! across courses; consumers treat the stream as a cache-invalidation hint
//! and re-fetch authoritative counts.
//!
//! Events are collected inside the committing transaction but published
//! strictly after commit — a rolled-back operation must never be observable
//! through the broadcast stream.

use crate::types::SeatChange;
use std::future::Future;
use std::pin::Pin;
use tokio::sync::broadcast;

/// Publisher side of the seat-change stream.
///
/// Implementations must not fail the calling operation: the transaction has
/// already committed by the time `publish` runs, so delivery problems are
/// logged and swallowed.
pub trait SeatChangeBroadcaster: Send + Sync {
    /// Publish a committed seat change to all subscribers.
    fn publish(&self, change: SeatChange) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// In-process broadcaster backed by a `tokio::sync::broadcast` channel.
///
/// Lagging receivers drop the oldest messages, which is acceptable for a
/// cache-invalidation hint. With no subscribers at all, publishes are
/// silently discarded.
#[derive(Clone)]
pub struct BroadcastChannel {
    tx: broadcast::Sender<SeatChange>,
}

impl BroadcastChannel {
    /// Create a channel retaining up to `capacity` undelivered events per
    /// subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to the seat-change stream.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SeatChange> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastChannel {
    fn default() -> Self {
        Self::new(256)
    }
}

impl SeatChangeBroadcaster for BroadcastChannel {
    fn publish(&self, change: SeatChange) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            match self.tx.send(change) {
                Ok(delivered) => {
                    tracing::trace!(subscribers = delivered, "seat change broadcast");
                }
                Err(_) => {
                    // No live subscribers; the event is a hint, drop it.
                    tracing::trace!("seat change dropped, no subscribers");
                }
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use crate::types::{CourseId, SeatAction, SeatCategory, SeatChangeCause};

    fn sample_change() -> SeatChange {
        SeatChange::now(
            CourseId::new(),
            SeatCategory::Primary,
            SeatAction::Reserve,
            SeatChangeCause::RequestCreated,
        )
    }

    #[tokio::test]
    async fn delivers_to_every_subscriber() {
        let channel = BroadcastChannel::new(8);
        let mut rx_a = channel.subscribe();
        let mut rx_b = channel.subscribe();

        let change = sample_change();
        channel.publish(change.clone()).await;

        assert_eq!(rx_a.recv().await.unwrap(), change);
        assert_eq!(rx_b.recv().await.unwrap(), change);
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_a_no_op() {
        let channel = BroadcastChannel::new(8);
        assert_eq!(channel.subscriber_count(), 0);
        // Must not panic or error.
        channel.publish(sample_change()).await;
    }

    #[tokio::test]
    async fn subscribers_only_see_events_published_after_subscribing() {
        let channel = BroadcastChannel::new(8);
        channel.publish(sample_change()).await;

        let mut rx = channel.subscribe();
        let second = sample_change();
        channel.publish(second.clone()).await;

        assert_eq!(rx.recv().await.unwrap(), second);
        assert!(rx.try_recv().is_err());
    }
}
