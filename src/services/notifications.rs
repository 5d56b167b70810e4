use std::collections::HashMap;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::debug;

use crate::models::ScreeningId;

/// Signal that a screening's seat map changed. Carries no delta: receivers
/// are expected to re-fetch the current seat snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatsChanged {
    pub screening_id: ScreeningId,
}

/// Best-effort fan-out of seat-map-change signals, keyed by screening id.
///
/// Each screening gets its own broadcast channel, so subscribers of one
/// screening never see another screening's updates. Publishing never
/// blocks: a slow subscriber lags and loses old signals rather than
/// stalling the publisher.
pub struct NotificationBus {
    channels: RwLock<HashMap<ScreeningId, broadcast::Sender<SeatsChanged>>>,
    capacity: usize,
}

impl NotificationBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    /// Notifies all current subscribers of the screening. At-most-once
    /// delivery; no subscribers means the signal is simply dropped. A
    /// channel whose last subscriber is gone is removed here, so the map
    /// only holds screenings someone is (or was just) watching.
    pub fn publish(&self, screening_id: ScreeningId) {
        let stale = {
            let channels = self.channels.read();
            match channels.get(&screening_id) {
                Some(sender) if sender.receiver_count() == 0 => true,
                Some(sender) => {
                    let delivered = sender
                        .send(SeatsChanged { screening_id })
                        .unwrap_or_default();
                    debug!(%screening_id, subscribers = delivered, "published seats-changed");
                    false
                }
                None => false,
            }
        };
        if stale {
            let mut channels = self.channels.write();
            // Re-check under the write lock; a subscriber may have arrived.
            if channels
                .get(&screening_id)
                .is_some_and(|s| s.receiver_count() == 0)
            {
                channels.remove(&screening_id);
                debug!(%screening_id, "pruned channel with no subscribers");
            }
        }
    }

    /// Subscribes to a single screening's change signals. Dropping (or
    /// `unsubscribe`-ing) the returned handle ends the subscription;
    /// switching screenings is unsubscribe plus a fresh subscribe.
    pub fn subscribe(&self, screening_id: ScreeningId) -> Subscription {
        let mut channels = self.channels.write();
        let sender = channels
            .entry(screening_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0);
        Subscription {
            screening_id,
            receiver: sender.subscribe(),
        }
    }

    /// Number of live subscribers for a screening.
    pub fn subscriber_count(&self, screening_id: ScreeningId) -> usize {
        self.channels
            .read()
            .get(&screening_id)
            .map_or(0, |s| s.receiver_count())
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new(64)
    }
}

/// A live subscription to one screening's change signals.
pub struct Subscription {
    screening_id: ScreeningId,
    receiver: broadcast::Receiver<SeatsChanged>,
}

impl Subscription {
    pub fn screening_id(&self) -> ScreeningId {
        self.screening_id
    }

    /// Waits for the next change signal. A lagged receiver skips the
    /// signals it lost and keeps going (the contract is "something
    /// changed, re-fetch", so a coalesced wake-up is as good as many).
    /// Returns `None` once the bus side is gone.
    pub async fn recv(&mut self) -> Option<SeatsChanged> {
        loop {
            match self.receiver.recv().await {
                Ok(changed) => return Some(changed),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(
                        screening_id = %self.screening_id,
                        skipped,
                        "subscriber lagged, coalescing missed signals"
                    );
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Explicitly ends the subscription.
    pub fn unsubscribe(self) {}
}
