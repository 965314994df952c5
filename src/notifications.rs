use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// Payload of a "day card updated" event, identifying the affected calendar
/// date by its denormalized components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCardUpdate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

/// In-process publish/subscribe bus for day-card changes.
///
/// Repositories publish after a successful mutating transaction; calendar
/// views subscribe and re-query the dates they display. Delivery is
/// best-effort fan-out to current subscribers only - there is no replay of
/// missed events, and publishing with no subscribers is not an error.
#[derive(Debug, Clone)]
pub struct NotificationBus {
    sender: broadcast::Sender<DayCardUpdate>,
}

impl NotificationBus {
    /// Creates a bus whose per-subscriber buffer holds `capacity` pending
    /// events. Slow subscribers that fall further behind see a lag error on
    /// receive and simply re-query.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DayCardUpdate> {
        self.sender.subscribe()
    }

    pub fn publish(&self, update: DayCardUpdate) {
        match self.sender.send(update) {
            Ok(subscriber_count) => debug!(
                "Published day card update for {}-{:02}-{:02} to {} subscriber(s)",
                update.year, update.month, update.day, subscriber_count
            ),
            // No subscribers currently registered; the event is dropped.
            Err(_) => debug!(
                "No subscribers for day card update {}-{:02}-{:02}",
                update.year, update.month, update.day
            ),
        }
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new(32)
    }
}
