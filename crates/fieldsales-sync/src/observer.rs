//! Update subscriptions.
//!
//! Callbacks run synchronously on the thread that calls
//! [`Subscribers::notify`], in the order they were subscribed. A callback may
//! subscribe or unsubscribe while being notified; the change applies from the
//! next notification.

use std::sync::{Arc, Mutex, MutexGuard};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Registry<T> {
    next_id: u64,
    callbacks: Vec<(u64, Callback<T>)>,
}

/// Handle returned by [`Subscribers::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

/// A shared list of update callbacks.
///
/// Cloning yields another handle to the same list.
pub struct Subscribers<T> {
    registry: Arc<Mutex<Registry<T>>>,
}

impl<T> Clone for Subscribers<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<T> Default for Subscribers<T> {
    fn default() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                callbacks: Vec::new(),
            })),
        }
    }
}

impl<T> std::fmt::Debug for Subscribers<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("len", &self.len())
            .finish()
    }
}

impl<T> Subscribers<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, Registry<T>> {
        self.registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registers a callback and returns its subscription handle.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let mut registry = self.registry();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.callbacks.push((id, Arc::new(callback)));
        Subscription(id)
    }

    /// Removes a callback. Returns false if it was already removed.
    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        let mut registry = self.registry();
        let before = registry.callbacks.len();
        registry.callbacks.retain(|(id, _)| *id != subscription.0);
        registry.callbacks.len() != before
    }

    /// Delivers `value` to every callback in subscription order.
    pub fn notify(&self, value: &T) {
        // Snapshot so callbacks can touch the registry without deadlocking.
        let callbacks: Vec<Callback<T>> = self
            .registry()
            .callbacks
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();
        for callback in callbacks {
            callback(value);
        }
    }

    pub fn len(&self) -> usize {
        self.registry().callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_notify_in_subscription_order() {
        let subscribers = Subscribers::<u32>::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let log = Arc::clone(&log);
            subscribers.subscribe(move |v: &u32| log.lock().unwrap().push(format!("{tag}:{v}")));
        }

        subscribers.notify(&7);

        assert_eq!(
            *log.lock().unwrap(),
            vec!["first:7", "second:7", "third:7"]
        );
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let subscribers = Subscribers::<u32>::new();
        let count = Arc::new(Mutex::new(0));

        let c = Arc::clone(&count);
        let sub = subscribers.subscribe(move |_| *c.lock().unwrap() += 1);

        subscribers.notify(&1);
        assert!(subscribers.unsubscribe(&sub));
        assert!(!subscribers.unsubscribe(&sub));
        subscribers.notify(&2);

        assert_eq!(*count.lock().unwrap(), 1);
        assert!(subscribers.is_empty());
    }

    #[test]
    fn test_clones_share_registry() {
        let subscribers = Subscribers::<u32>::new();
        let other = subscribers.clone();
        other.subscribe(|_| {});
        assert_eq!(subscribers.len(), 1);
    }

    #[test]
    fn test_callback_may_unsubscribe_itself() {
        let subscribers = Subscribers::<u32>::new();
        let handle = subscribers.clone();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let slot_in = Arc::clone(&slot);
        let sub = subscribers.subscribe(move |_| {
            if let Some(sub) = slot_in.lock().unwrap().take() {
                handle.unsubscribe(&sub);
            }
        });
        *slot.lock().unwrap() = Some(sub);

        subscribers.notify(&1);
        assert!(subscribers.is_empty());
    }
}
