// THEORY:
// The `ingestion` module is the boundary between the external estimators and
// the engine. Pose and hand models push frames at their own, possibly
// irregular cadence; the `IngestionHub` stamps each frame with the current
// monotonic time and republishes it on an internal multi-subscriber channel.
//
// Key architectural principles:
// 1.  **Fan-Out, No Queue**: Broadcast channels give every subscriber its own
//     view of the stream. A slow subscriber does not exert back-pressure on
//     the producer; it simply misses intermediate frames and resumes at the
//     newest one. Within one source, the frames a subscriber does see are
//     always in production order.
// 2.  **Our Clock, Not Theirs**: Timestamps are assigned at ingestion, never
//     taken from the producer. The two sources are independent and interleave
//     with no ordering guarantee between them.
// 3.  **Closure as Terminal Signal**: Dropping the hub closes both channels.
//     Consumers treat a closed channel as "producer closed, stop emitting
//     derived events" — it is a lifecycle signal, not a value.

use crate::core_modules::landmark::{BodyFrame, HandFrame, TimedEvent};
use tokio::sync::broadcast;

/// Frames a subscriber can fall behind by before it starts skipping. Small on
/// purpose: stale landmark frames are worthless to an interactive cursor.
const CHANNEL_CAPACITY: usize = 16;

/// Timestamps and republishes the external body and hand landmark streams on
/// internal broadcast channels.
pub struct IngestionHub {
    body_tx: broadcast::Sender<TimedEvent<BodyFrame>>,
    hand_tx: broadcast::Sender<TimedEvent<HandFrame>>,
}

impl IngestionHub {
    pub fn new() -> Self {
        let (body_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (hand_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { body_tx, hand_tx }
    }

    /// Stamps a body frame with the current monotonic time and fans it out.
    /// Publishing with no live subscribers is not an error.
    pub fn publish_body(&self, frame: BodyFrame) {
        let _ = self.body_tx.send(TimedEvent::now(frame));
    }

    /// Stamps a hand frame with the current monotonic time and fans it out.
    pub fn publish_hand(&self, frame: HandFrame) {
        let _ = self.hand_tx.send(TimedEvent::now(frame));
    }

    /// Subscribes to the timestamped body stream. A consumer re-subscribing
    /// (e.g. after a handedness change) must drop its previous receiver
    /// first, so at most one subscription per consumer is ever live.
    pub fn subscribe_body(&self) -> broadcast::Receiver<TimedEvent<BodyFrame>> {
        self.body_tx.subscribe()
    }

    /// Subscribes to the timestamped hand stream.
    pub fn subscribe_hand(&self) -> broadcast::Receiver<TimedEvent<HandFrame>> {
        self.hand_tx.subscribe()
    }
}

impl Default for IngestionHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::landmark::Landmark;
    use tokio::sync::broadcast::error::RecvError;

    #[tokio::test]
    async fn stamps_and_fans_out_to_every_subscriber() {
        let hub = IngestionHub::new();
        let mut a = hub.subscribe_body();
        let mut b = hub.subscribe_body();

        let before = std::time::Instant::now();
        hub.publish_body(BodyFrame {
            pose_landmarks: vec![Landmark::ZERO; 33],
        });

        let got_a = a.recv().await.expect("subscriber a");
        let got_b = b.recv().await.expect("subscriber b");
        assert_eq!(got_a.data, got_b.data);
        assert!(got_a.t >= before);
    }

    #[tokio::test]
    async fn order_is_preserved_within_one_source() {
        let hub = IngestionHub::new();
        let mut rx = hub.subscribe_body();

        for i in 0..4 {
            hub.publish_body(BodyFrame {
                pose_landmarks: vec![
                    Landmark {
                        x: i as f64,
                        ..Landmark::ZERO
                    };
                    1
                ],
            });
        }
        for i in 0..4 {
            let ev = rx.recv().await.expect("frame");
            assert_eq!(ev.data.pose_landmarks[0].x, i as f64);
        }
    }

    #[tokio::test]
    async fn lagged_subscriber_skips_to_newest_frames() {
        let hub = IngestionHub::new();
        let mut rx = hub.subscribe_hand();

        // Overflow the channel so the subscriber falls behind.
        for _ in 0..(CHANNEL_CAPACITY + 8) {
            hub.publish_hand(HandFrame::default());
        }

        match rx.recv().await {
            Err(RecvError::Lagged(missed)) => assert!(missed >= 1),
            other => panic!("expected lag, got {other:?}"),
        }
        // After the lag notice the stream resumes with live frames.
        assert!(rx.recv().await.is_ok());
    }

    #[tokio::test]
    async fn dropping_the_hub_closes_the_stream() {
        let hub = IngestionHub::new();
        let mut rx = hub.subscribe_body();
        drop(hub);
        assert!(matches!(rx.recv().await, Err(RecvError::Closed)));
    }
}
