use std::sync::{Arc, PoisonError, RwLock, Weak};

use crate::events::{EventName, VideoEvent};

/// Trait for receiving normalized events.
/// Implementations must be Send + Sync (native SDKs emit from their own threads).
pub trait VideoEventListener: Send + Sync {
    fn on_event(&self, event: &VideoEvent);
}

impl<F> VideoEventListener for F
where
    F: Fn(&VideoEvent) + Send + Sync,
{
    fn on_event(&self, event: &VideoEvent) {
        self(event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Entry {
    id: SubscriptionId,
    event: EventName,
    listener: Arc<dyn VideoEventListener>,
}

#[derive(Default)]
struct Registry {
    closed: bool,
    next_id: u64,
    entries: Vec<Entry>,
}

/// UI-side listener registry, keyed by event name.
///
/// Events are delivered in the order they are dispatched, to every
/// matching listener in registration order.
#[derive(Clone, Default)]
pub struct EventHub {
    registry: Arc<RwLock<Registry>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, event: EventName, listener: Arc<dyn VideoEventListener>) -> Subscription {
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        let id = SubscriptionId(registry.next_id);
        registry.next_id += 1;

        if registry.closed {
            tracing::debug!(%event, "hub closed, subscription is inert");
            return Subscription::inert(id, event);
        }

        registry.entries.push(Entry { id, event, listener });
        Subscription {
            id,
            event,
            registry: Arc::downgrade(&self.registry),
        }
    }

    pub fn dispatch(&self, event: &VideoEvent) {
        let name = event.name();
        // Snapshot so listeners may (un)subscribe while being called.
        let targets: Vec<(SubscriptionId, Arc<dyn VideoEventListener>)> = {
            let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
            if registry.closed {
                return;
            }
            registry
                .entries
                .iter()
                .filter(|e| e.event == name)
                .map(|e| (e.id, e.listener.clone()))
                .collect()
        };

        for (id, listener) in targets {
            if self.is_registered(id) {
                listener.on_event(event);
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_closed(&self) -> bool {
        self.registry.read().unwrap_or_else(PoisonError::into_inner).closed
    }

    /// Drop every listener. Nothing is delivered afterwards.
    pub fn close(&self) {
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        registry.closed = true;
        registry.entries.clear();
    }

    fn is_registered(&self, id: SubscriptionId) -> bool {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .iter()
            .any(|e| e.id == id)
    }
}

/// Handle for one registered listener.
///
/// Released by [`Subscription::remove`] or on drop, whichever comes first.
#[must_use = "dropping a Subscription removes its listener"]
pub struct Subscription {
    id: SubscriptionId,
    event: EventName,
    registry: Weak<RwLock<Registry>>,
}

impl Subscription {
    fn inert(id: SubscriptionId, event: EventName) -> Self {
        Self {
            id,
            event,
            registry: Weak::new(),
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn event(&self) -> EventName {
        self.event
    }

    pub fn is_active(&self) -> bool {
        self.registry.upgrade().is_some_and(|registry| {
            registry
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .entries
                .iter()
                .any(|e| e.id == self.id)
        })
    }

    pub fn remove(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entries
                .retain(|e| e.id != self.id);
        }
        self.registry = Weak::new();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{CameraEvent, DataMessage};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingListener {
        count: Arc<AtomicUsize>,
    }

    impl VideoEventListener for CountingListener {
        fn on_event(&self, _event: &VideoEvent) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn message(text: &str) -> VideoEvent {
        VideoEvent::DataTrackMessageReceived(DataMessage {
            message: text.to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn hub_dispatches_to_listener() {
        let hub = EventHub::new();
        let count = Arc::new(AtomicUsize::new(0));
        let _sub = hub.subscribe(
            EventName::DataTrackMessageReceived,
            Arc::new(CountingListener { count: count.clone() }),
        );

        hub.dispatch(&message("hi"));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn hub_dispatches_to_multiple_listeners_for_same_event() {
        let hub = EventHub::new();
        let count1 = Arc::new(AtomicUsize::new(0));
        let count2 = Arc::new(AtomicUsize::new(0));

        let _a = hub.subscribe(
            EventName::DataTrackMessageReceived,
            Arc::new(CountingListener { count: count1.clone() }),
        );
        let _b = hub.subscribe(
            EventName::DataTrackMessageReceived,
            Arc::new(CountingListener { count: count2.clone() }),
        );

        hub.dispatch(&message("hi"));
        assert_eq!(count1.load(Ordering::SeqCst), 1);
        assert_eq!(count2.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn other_events_are_not_delivered() {
        let hub = EventHub::new();
        let count = Arc::new(AtomicUsize::new(0));
        let _sub = hub.subscribe(
            EventName::CameraDidStart,
            Arc::new(CountingListener { count: count.clone() }),
        );

        hub.dispatch(&message("hi"));
        assert_eq!(count.load(Ordering::SeqCst), 0);
        hub.dispatch(&VideoEvent::CameraDidStart(CameraEvent::default()));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn events_keep_dispatch_order() {
        let hub = EventHub::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let _sub = hub.subscribe(
            EventName::DataTrackMessageReceived,
            Arc::new(move |event: &VideoEvent| {
                if let VideoEvent::DataTrackMessageReceived(m) = event {
                    s.lock().unwrap().push(m.message.clone());
                }
            }),
        );

        for text in ["a", "b", "a"] {
            hub.dispatch(&message(text));
        }
        assert_eq!(*seen.lock().unwrap(), vec!["a", "b", "a"]);
    }

    #[test]
    fn removed_subscription_stops_delivery() {
        let hub = EventHub::new();
        let count = Arc::new(AtomicUsize::new(0));
        let sub = hub.subscribe(
            EventName::DataTrackMessageReceived,
            Arc::new(CountingListener { count: count.clone() }),
        );
        assert!(sub.is_active());

        sub.remove();
        hub.dispatch(&message("hi"));
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(hub.listener_count(), 0);
    }

    #[test]
    fn dropping_subscription_releases_it() {
        let hub = EventHub::new();
        {
            let _sub = hub.subscribe(
                EventName::StatsReceived,
                Arc::new(|_: &VideoEvent| {}),
            );
            assert_eq!(hub.listener_count(), 1);
        }
        assert_eq!(hub.listener_count(), 0);
    }

    #[test]
    fn closed_hub_delivers_nothing() {
        let hub = EventHub::new();
        let count = Arc::new(AtomicUsize::new(0));
        let sub = hub.subscribe(
            EventName::DataTrackMessageReceived,
            Arc::new(CountingListener { count: count.clone() }),
        );

        assert!(!hub.is_closed());
        hub.close();
        assert!(hub.is_closed());
        hub.dispatch(&message("hi"));
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!sub.is_active());

        let late = hub.subscribe(
            EventName::DataTrackMessageReceived,
            Arc::new(CountingListener { count: count.clone() }),
        );
        assert!(!late.is_active());
        hub.dispatch(&message("hi"));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn listener_removed_mid_dispatch_is_skipped() {
        let hub = EventHub::new();
        let count = Arc::new(AtomicUsize::new(0));
        let victim: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let v = victim.clone();
        let _first = hub.subscribe(
            EventName::DataTrackMessageReceived,
            Arc::new(move |_: &VideoEvent| {
                if let Some(sub) = v.lock().unwrap().take() {
                    sub.remove();
                }
            }),
        );
        let second = hub.subscribe(
            EventName::DataTrackMessageReceived,
            Arc::new(CountingListener { count: count.clone() }),
        );
        *victim.lock().unwrap() = Some(second);

        hub.dispatch(&message("hi"));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
