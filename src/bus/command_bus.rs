use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use super::CommandKey;

type Listener = Arc<dyn Fn(&CommandKey) + Send + Sync>;

struct BusInner {
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_id: AtomicU64,
}

/// Synchronous publish/subscribe channel for toolbar commands.
///
/// Delivery is in registration order and happens entirely within `publish`.
/// There is no buffering or replay: a command published while no listener is
/// registered is dropped. The bus exists purely to decouple a page-agnostic
/// toolbar from whichever list view is currently mounted.
#[derive(Clone)]
pub struct CommandBus {
    inner: Arc<BusInner>,
}

impl CommandBus {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                listeners: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Deliver `key` to every registered listener, in registration order.
    ///
    /// A panicking listener is logged and skipped; later listeners still run.
    pub fn publish(&self, key: &CommandKey) {
        let snapshot: Vec<(u64, Listener)> = self
            .inner
            .listeners
            .lock()
            .expect("command bus mutex poisoned")
            .clone();

        if snapshot.is_empty() {
            tracing::debug!("command '{key}' published with no listeners, dropped");
            return;
        }

        for (id, listener) in snapshot {
            if catch_unwind(AssertUnwindSafe(|| listener(key))).is_err() {
                tracing::warn!("command listener {id} panicked handling '{key}'");
            }
        }
    }

    /// Register a listener and return its unsubscribe handle.
    pub fn subscribe(
        &self,
        listener: impl Fn(&CommandKey) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .listeners
            .lock()
            .expect("command bus mutex poisoned")
            .push((id, Arc::new(listener)));
        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Number of currently registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner
            .listeners
            .lock()
            .expect("command bus mutex poisoned")
            .len()
    }
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle detaching one listener from the bus.
///
/// Unsubscribing is unconditional, immediate, and idempotent; dropping the
/// handle unsubscribes as well.
pub struct Subscription {
    id: u64,
    bus: Weak<BusInner>,
}

impl Subscription {
    pub fn unsubscribe(&self) {
        if let Some(inner) = self.bus.upgrade() {
            inner
                .listeners
                .lock()
                .expect("command bus mutex poisoned")
                .retain(|(id, _)| *id != self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    fn counter_listener(counter: &Arc<AtomicUsize>) -> impl Fn(&CommandKey) + Send + Sync {
        let counter = counter.clone();
        move |_key| {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn publish_reaches_current_subscriber_only() {
        let bus = CommandBus::new();
        let a = Arc::new(AtomicUsize::new(0));
        let b = Arc::new(AtomicUsize::new(0));

        let sub_a = bus.subscribe(counter_listener(&a));
        bus.publish(&CommandKey::Refresh);
        assert_eq!(a.load(Ordering::SeqCst), 1);

        sub_a.unsubscribe();
        let _sub_b = bus.subscribe(counter_listener(&b));
        bus.publish(&CommandKey::Refresh);

        assert_eq!(a.load(Ordering::SeqCst), 1, "stale listener must not fire");
        assert_eq!(b.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn delivery_follows_registration_order() {
        let bus = CommandBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let first = {
            let order = order.clone();
            bus.subscribe(move |_| order.lock().unwrap().push("first"))
        };
        let second = {
            let order = order.clone();
            bus.subscribe(move |_| order.lock().unwrap().push("second"))
        };

        bus.publish(&CommandKey::Sort);
        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);

        drop(first);
        drop(second);
    }

    #[test]
    fn panicking_listener_does_not_block_later_listeners() {
        let bus = CommandBus::new();
        let reached = Arc::new(AtomicUsize::new(0));

        let _bad = bus.subscribe(|_| panic!("listener bug"));
        let _good = bus.subscribe(counter_listener(&reached));

        bus.publish(&CommandKey::Refresh);
        assert_eq!(reached.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn publish_with_zero_listeners_is_a_silent_drop() {
        let bus = CommandBus::new();
        bus.publish(&CommandKey::Refresh);
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let bus = CommandBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let sub = bus.subscribe(counter_listener(&hits));
        sub.unsubscribe();
        sub.unsubscribe();
        assert_eq!(bus.listener_count(), 0);

        bus.publish(&CommandKey::Refresh);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let bus = CommandBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        {
            let _sub = bus.subscribe(counter_listener(&hits));
            assert_eq!(bus.listener_count(), 1);
        }
        assert_eq!(bus.listener_count(), 0);
    }
}
