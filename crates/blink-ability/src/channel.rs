//! Synchronous publish/subscribe channel.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

type Callback<T> = Rc<RefCell<dyn FnMut(&T)>>;

struct Slot<T> {
    connected: Rc<Cell<bool>>,
    callback: Callback<T>,
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self {
            connected: self.connected.clone(),
            callback: self.callback.clone(),
        }
    }
}

/// Handle to one connection. Clones refer to the same connection.
#[derive(Debug, Clone)]
pub struct Subscription {
    connected: Rc<Cell<bool>>,
}

impl Subscription {
    pub fn disconnect(&self) {
        self.connected.set(false);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.get()
    }
}

/// Publishes events to subscribers in subscription order.
///
/// Subscribers may disconnect themselves or each other while a publish is in
/// flight: a subscription disconnected mid-publish is not called afterwards,
/// and every other subscriber is still called exactly once.
pub struct EventChannel<T> {
    slots: RefCell<Vec<Slot<T>>>,
    destroyed: Cell<bool>,
}

impl<T> Default for EventChannel<T> {
    fn default() -> Self {
        Self {
            slots: RefCell::new(Vec::new()),
            destroyed: Cell::new(false),
        }
    }
}

impl<T> EventChannel<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect a callback. Returns `None` once the channel is destroyed.
    pub fn subscribe(&self, callback: impl FnMut(&T) + 'static) -> Option<Subscription> {
        if self.destroyed.get() {
            return None;
        }
        let connected = Rc::new(Cell::new(true));
        self.slots.borrow_mut().push(Slot {
            connected: connected.clone(),
            callback: Rc::new(RefCell::new(callback)),
        });
        Some(Subscription { connected })
    }

    /// Call every connected subscriber with `event`.
    pub fn publish(&self, event: &T) {
        if self.destroyed.get() {
            return;
        }
        // Iterate a snapshot so callbacks can subscribe or disconnect freely.
        let snapshot: Vec<Slot<T>> = {
            let mut slots = self.slots.borrow_mut();
            slots.retain(|slot| slot.connected.get());
            slots.clone()
        };
        for slot in snapshot {
            if !slot.connected.get() {
                continue;
            }
            // A callback already on the stack is being re-entered; skip it.
            if let Ok(mut callback) = slot.callback.try_borrow_mut() {
                (&mut *callback)(event);
            }
        }
    }

    /// Disconnect everything and ignore all further calls.
    pub fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        let slots = std::mem::take(&mut *self.slots.borrow_mut());
        for slot in slots {
            slot.connected.set(false);
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    /// Number of connected subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.slots
            .borrow()
            .iter()
            .filter(|slot| slot.connected.get())
            .count()
    }
}
