//! Process-wide guest change feed. Every successful guest mutation
//! publishes here; the guest page holds an EventSource on the SSE endpoint
//! and reloads on any event (a full re-fetch, no incremental merge).

use serde::Serialize;
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuestChange {
    Created,
    Updated,
    Deleted,
}

impl GuestChange {
    pub fn as_str(self) -> &'static str {
        match self {
            GuestChange::Created => "created",
            GuestChange::Updated => "updated",
            GuestChange::Deleted => "deleted",
        }
    }
}

pub type GuestFeed = broadcast::Sender<GuestChange>;

pub fn guest_feed() -> GuestFeed {
    // Slow subscribers that lag just miss events; the next one still
    // triggers a reload.
    broadcast::channel(16).0
}

/// Fire-and-forget publish; no subscribers is not an error.
pub fn publish(feed: &GuestFeed, change: GuestChange) {
    let _ = feed.send(change);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_changes() {
        let feed = guest_feed();
        let mut rx = feed.subscribe();
        publish(&feed, GuestChange::Created);
        publish(&feed, GuestChange::Deleted);
        assert_eq!(rx.recv().await.unwrap(), GuestChange::Created);
        assert_eq!(rx.recv().await.unwrap(), GuestChange::Deleted);
    }

    #[test]
    fn publish_without_subscribers_is_a_noop() {
        let feed = guest_feed();
        publish(&feed, GuestChange::Updated);
    }
}
