//! Single-threaded input channels.
//!
//! Each external input (document change, scroll sample, listing parameters)
//! is a [`Signal`]. Consumers subscribe a recompute callback and hold the
//! returned [`Subscription`]; dropping it detaches the callback, so a torn
//! down view can never be called again.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type Callback<T> = Rc<RefCell<dyn FnMut(&T)>>;

struct Subscribers<T> {
    next_id: Cell<u64>,
    entries: RefCell<Vec<(u64, Callback<T>)>>,
}

impl<T> Subscribers<T> {
    fn remove(&self, id: u64) {
        self.entries.borrow_mut().retain(|(entry_id, _)| *entry_id != id);
    }

    fn is_subscribed(&self, id: u64) -> bool {
        self.entries.borrow().iter().any(|(entry_id, _)| *entry_id == id)
    }
}

/// A broadcast channel of `T` values.
pub struct Signal<T> {
    subscribers: Rc<Subscribers<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            subscribers: Rc::clone(&self.subscribers),
        }
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self {
            subscribers: Rc::new(Subscribers {
                next_id: Cell::new(0),
                entries: RefCell::new(Vec::new()),
            }),
        }
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("subscribers", &self.subscribers.entries.borrow().len())
            .finish()
    }
}

impl<T: 'static> Signal<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback`; it runs on every [`emit`](Self::emit) until the
    /// returned subscription is dropped or unsubscribed.
    pub fn subscribe(&self, callback: impl FnMut(&T) + 'static) -> Subscription {
        let id = self.subscribers.next_id.get();
        self.subscribers.next_id.set(id + 1);
        let callback: Callback<T> = Rc::new(RefCell::new(callback));
        self.subscribers.entries.borrow_mut().push((id, callback));

        let weak: Weak<Subscribers<T>> = Rc::downgrade(&self.subscribers);
        Subscription {
            release: Some(Box::new(move || {
                if let Some(subscribers) = weak.upgrade() {
                    subscribers.remove(id);
                }
            })),
        }
    }

    /// Deliver `value` to every current subscriber, in subscription order.
    ///
    /// Callbacks may subscribe or unsubscribe while running; a subscriber
    /// removed during delivery is not called afterwards. A callback that
    /// re-emits on the same signal is skipped for the nested delivery.
    pub fn emit(&self, value: &T) {
        let snapshot: Vec<(u64, Callback<T>)> = self.subscribers.entries.borrow().clone();
        for (id, callback) in snapshot {
            if !self.subscribers.is_subscribed(id) {
                continue;
            }
            let Ok(mut callback) = callback.try_borrow_mut() else {
                tracing::warn!(subscriber = id, "re-entrant emit skipped");
                continue;
            };
            (&mut *callback)(value);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.entries.borrow().len()
    }
}

/// Handle to a registered callback. Unsubscribes on drop.
#[must_use = "dropping a subscription immediately unsubscribes it"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Detach now. Equivalent to dropping the handle.
    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_reaches_subscribers_in_order() {
        let signal = Signal::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let a = {
            let log = Rc::clone(&log);
            signal.subscribe(move |v: &i32| log.borrow_mut().push(("a", *v)))
        };
        let b = {
            let log = Rc::clone(&log);
            signal.subscribe(move |v: &i32| log.borrow_mut().push(("b", *v)))
        };
        signal.emit(&7);
        assert_eq!(*log.borrow(), vec![("a", 7), ("b", 7)]);
        drop((a, b));
    }

    #[test]
    fn test_drop_unsubscribes() {
        let signal = Signal::new();
        let hits = Rc::new(Cell::new(0));
        let sub = {
            let hits = Rc::clone(&hits);
            signal.subscribe(move |_: &()| hits.set(hits.get() + 1))
        };
        signal.emit(&());
        drop(sub);
        signal.emit(&());
        assert_eq!(hits.get(), 1);
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn test_explicit_unsubscribe() {
        let signal: Signal<u8> = Signal::new();
        let sub = signal.subscribe(|_| {});
        assert_eq!(signal.subscriber_count(), 1);
        sub.unsubscribe();
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn test_subscription_outliving_signal_is_harmless() {
        let signal: Signal<u8> = Signal::new();
        let sub = signal.subscribe(|_| {});
        drop(signal);
        drop(sub);
    }

    #[test]
    fn test_clones_share_subscribers() {
        let signal = Signal::new();
        let other = signal.clone();
        let hits = Rc::new(Cell::new(0));
        let _sub = {
            let hits = Rc::clone(&hits);
            signal.subscribe(move |_: &u8| hits.set(hits.get() + 1))
        };
        other.emit(&1);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_unsubscribe_during_emit_skips_later_subscriber() {
        let signal: Signal<u8> = Signal::new();
        let hits = Rc::new(Cell::new(0));
        let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let _killer = {
            let victim = Rc::clone(&victim);
            signal.subscribe(move |_| {
                victim.borrow_mut().take();
            })
        };
        let sub = {
            let hits = Rc::clone(&hits);
            signal.subscribe(move |_| hits.set(hits.get() + 1))
        };
        *victim.borrow_mut() = Some(sub);

        signal.emit(&0);
        assert_eq!(hits.get(), 0);
        assert_eq!(signal.subscriber_count(), 1);
    }
}
