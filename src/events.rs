use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Buffered events per subscriber before a slow consumer starts lagging
const CHANNEL_CAPACITY: usize = 64;

/// A rating row was inserted or overwritten
///
/// Published system-wide: subscribers see every user's rating changes and
/// re-scope to their own caller when they react.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RatingChanged {
    pub user_id: Uuid,
    pub movie_id: Uuid,
    pub rating: i32,
}

/// Fan-out channel for rating mutations
///
/// Each live analytics stream holds exactly one receiver, acquired when
/// the stream starts and released when it is dropped, whichever way the
/// connection ends.
#[derive(Clone)]
pub struct RatingEvents {
    sender: broadcast::Sender<RatingChanged>,
}

impl Default for RatingEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl RatingEvents {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publishes a change; having no subscribers is not an error
    pub fn publish(&self, event: RatingChanged) {
        if self.sender.send(event).is_err() {
            tracing::debug!("Rating change published with no live subscribers");
        }
    }

    /// Opens a new subscription
    pub fn subscribe(&self) -> broadcast::Receiver<RatingChanged> {
        self.sender.subscribe()
    }

    /// Number of currently open subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
