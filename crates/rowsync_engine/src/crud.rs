//! Out-of-band create/update/delete events.
//!
//! Writers publish [`CrudEvent`]s on a [`CrudFeed`]; every synchronizer that
//! subscribed receives its own copy and reconciles it against its rows.
//! Delivery is at-least-once friendly: reconciling the same event twice has
//! the same effect as reconciling it once.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Receiving end of a [`CrudFeed`] subscription.
pub type CrudReceiver<R> = UnboundedReceiver<CrudEvent<R>>;

/// A row mutation that happened outside of a load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "row", rename_all = "snake_case")]
pub enum CrudEvent<R> {
    /// A row was created.
    Create(R),
    /// A row was modified.
    Update(R),
    /// A row was deleted.
    Delete(R),
}

impl<R> CrudEvent<R> {
    /// The row carried by the event.
    pub fn row(&self) -> &R {
        match self {
            CrudEvent::Create(row) | CrudEvent::Update(row) | CrudEvent::Delete(row) => row,
        }
    }

    /// Lowercase name of the event kind.
    pub fn kind(&self) -> &'static str {
        match self {
            CrudEvent::Create(_) => "create",
            CrudEvent::Update(_) => "update",
            CrudEvent::Delete(_) => "delete",
        }
    }
}

/// Fan-out channel for CRUD events.
///
/// The feed is thread-safe; publishers may live on any thread. Subscribers
/// whose receiver was dropped are pruned on the next publish.
pub struct CrudFeed<R> {
    subscribers: RwLock<Vec<UnboundedSender<CrudEvent<R>>>>,
    published: AtomicU64,
}

impl<R: Clone> CrudFeed<R> {
    /// Creates a feed with no subscribers.
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            published: AtomicU64::new(0),
        }
    }

    /// Subscribes to all future events.
    pub fn subscribe(&self) -> CrudReceiver<R> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Sends an event to every live subscriber and returns how many received it.
    pub fn publish(&self, event: CrudEvent<R>) -> usize {
        self.published.fetch_add(1, Ordering::Relaxed);
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        subscribers.len()
    }

    /// Publishes a create event.
    pub fn created(&self, row: R) -> usize {
        self.publish(CrudEvent::Create(row))
    }

    /// Publishes an update event.
    pub fn updated(&self, row: R) -> usize {
        self.publish(CrudEvent::Update(row))
    }

    /// Publishes a delete event.
    pub fn deleted(&self, row: R) -> usize {
        self.publish(CrudEvent::Delete(row))
    }

    /// Number of subscribers still registered.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Total events published since creation.
    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

impl<R: Clone> Default for CrudFeed<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_and_receive() {
        let feed = CrudFeed::new();
        let mut rx = feed.subscribe();

        assert_eq!(feed.created("a"), 1);
        assert_eq!(rx.try_recv().unwrap(), CrudEvent::Create("a"));
    }

    #[test]
    fn multiple_subscribers() {
        let feed = CrudFeed::new();
        let mut rx1 = feed.subscribe();
        let mut rx2 = feed.subscribe();

        feed.deleted(7);

        assert_eq!(rx1.try_recv().unwrap(), CrudEvent::Delete(7));
        assert_eq!(rx2.try_recv().unwrap(), CrudEvent::Delete(7));
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let feed = CrudFeed::new();
        let rx = feed.subscribe();
        let _rx2 = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 2);

        drop(rx);
        assert_eq!(feed.updated(1), 1);
        assert_eq!(feed.subscriber_count(), 1);
        assert_eq!(feed.published_count(), 1);
    }

    #[test]
    fn event_accessors() {
        let event = CrudEvent::Update("row");
        assert_eq!(*event.row(), "row");
        assert_eq!(event.kind(), "update");
    }
}
