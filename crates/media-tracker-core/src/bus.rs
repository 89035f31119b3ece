//! Cross-view notification bus.
//!
//! Sibling views (movies / TV shows) learn that an item was added or deleted
//! elsewhere through typed events carrying only their identity. Delivery is
//! synchronous and in-process, handlers run outside the bus lock, and there
//! is no replay for late subscribers.

use media_tracker_models::MediaKind;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogEvent {
    Added(MediaKind),
    Deleted(MediaKind),
}

impl CatalogEvent {
    pub fn kind(&self) -> MediaKind {
        match self {
            CatalogEvent::Added(kind) | CatalogEvent::Deleted(kind) => *kind,
        }
    }
}

impl fmt::Display for CatalogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogEvent::Added(kind) => write!(f, "{}-added", kind),
            CatalogEvent::Deleted(kind) => write!(f, "{}-deleted", kind),
        }
    }
}

type Handler = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct BusInner {
    next_id: AtomicU64,
    handlers: Mutex<HashMap<CatalogEvent, Vec<(u64, Handler)>>>,
}

impl BusInner {
    fn handlers(&self) -> MutexGuard<'_, HashMap<CatalogEvent, Vec<(u64, Handler)>>> {
        self.handlers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn remove(&self, event: CatalogEvent, id: u64) -> bool {
        let mut handlers = self.handlers();
        let Some(list) = handlers.get_mut(&event) else {
            return false;
        };
        let before = list.len();
        list.retain(|(handler_id, _)| *handler_id != id);
        before != list.len()
    }

    fn handler(&self, event: CatalogEvent, id: u64) -> Option<Handler> {
        self.handlers()
            .get(&event)
            .and_then(|list| list.iter().find(|(handler_id, _)| *handler_id == id))
            .map(|(_, handler)| Arc::clone(handler))
    }
}

/// Cheap to clone; all clones share one set of subscribers
#[derive(Clone, Default)]
pub struct NotificationBus {
    inner: Arc<BusInner>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `event`. The handler stays registered until
    /// the returned guard is dropped or unsubscribed.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, event: CatalogEvent, handler: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .handlers()
            .entry(event)
            .or_default()
            .push((id, Arc::new(handler)));
        debug!(event = %event, subscription = id, "Subscribed");

        Subscription {
            bus: Arc::downgrade(&self.inner),
            event,
            id,
            active: true,
        }
    }

    /// Deliver `event` to every subscriber registered right now. Returns the
    /// number of handlers invoked.
    pub fn publish(&self, event: CatalogEvent) -> usize {
        let ids: Vec<u64> = self
            .inner
            .handlers()
            .get(&event)
            .map(|list| list.iter().map(|(id, _)| *id).collect())
            .unwrap_or_default();

        let mut delivered = 0;
        for id in ids {
            // A handler may unsubscribe another one mid-delivery
            if let Some(handler) = self.inner.handler(event, id) {
                handler();
                delivered += 1;
            }
        }
        trace!(event = %event, delivered, "Published");
        delivered
    }

    pub fn subscriber_count(&self, event: CatalogEvent) -> usize {
        self.inner.handlers().get(&event).map(Vec::len).unwrap_or(0)
    }
}

/// RAII guard for one bus registration
pub struct Subscription {
    bus: Weak<BusInner>,
    event: CatalogEvent,
    id: u64,
    active: bool,
}

impl Subscription {
    pub fn event(&self) -> CatalogEvent {
        self.event
    }

    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(bus) = self.bus.upgrade() {
            if bus.remove(self.event, self.id) {
                debug!(event = %self.event, subscription = self.id, "Unsubscribed");
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("event", &self.event)
            .field("id", &self.id)
            .field("active", &self.active)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let handle = Arc::clone(&count);
        (count, move || {
            handle.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_publish_reaches_only_matching_event() {
        let bus = NotificationBus::new();
        let (movies, on_movies) = counter();
        let (shows, on_shows) = counter();
        let _a = bus.subscribe(CatalogEvent::Added(MediaKind::Movie), on_movies);
        let _b = bus.subscribe(CatalogEvent::Added(MediaKind::TvShow), on_shows);

        assert_eq!(bus.publish(CatalogEvent::Added(MediaKind::Movie)), 1);
        assert_eq!(movies.load(Ordering::SeqCst), 1);
        assert_eq!(shows.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let bus = NotificationBus::new();
        let (count, handler) = counter();
        let sub = bus.subscribe(CatalogEvent::Deleted(MediaKind::Movie), handler);
        assert_eq!(bus.subscriber_count(CatalogEvent::Deleted(MediaKind::Movie)), 1);

        drop(sub);
        assert_eq!(bus.publish(CatalogEvent::Deleted(MediaKind::Movie)), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(bus.subscriber_count(CatalogEvent::Deleted(MediaKind::Movie)), 0);
    }

    #[test]
    fn test_no_replay_for_late_subscribers() {
        let bus = NotificationBus::new();
        bus.publish(CatalogEvent::Added(MediaKind::Movie));

        let (count, handler) = counter();
        let _sub = bus.subscribe(CatalogEvent::Added(MediaKind::Movie), handler);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_at_most_once_per_publish() {
        let bus = NotificationBus::new();
        let (count, handler) = counter();
        let _sub = bus.subscribe(CatalogEvent::Added(MediaKind::TvShow), handler);
        bus.publish(CatalogEvent::Added(MediaKind::TvShow));
        bus.publish(CatalogEvent::Added(MediaKind::TvShow));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_handler_may_publish_without_deadlock() {
        let bus = NotificationBus::new();
        let (count, handler) = counter();
        let _tail = bus.subscribe(CatalogEvent::Deleted(MediaKind::Movie), handler);

        let inner_bus = bus.clone();
        let _head = bus.subscribe(CatalogEvent::Added(MediaKind::Movie), move || {
            inner_bus.publish(CatalogEvent::Deleted(MediaKind::Movie));
        });

        bus.publish(CatalogEvent::Added(MediaKind::Movie));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscription_outliving_bus_is_harmless() {
        let bus = NotificationBus::new();
        let sub = bus.subscribe(CatalogEvent::Added(MediaKind::Movie), || {});
        drop(bus);
        sub.unsubscribe();
    }
}
