//! Change notification channel
//!
//! A plain ordered list of listeners. [`Emitter::emit`] carries no payload:
//! it only signals that something changed, and listeners read whatever state
//! they care about themselves.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type Listener = Rc<dyn Fn()>;

#[derive(Default)]
struct Listeners {
    entries: RefCell<Vec<(u64, Listener)>>,
    next_id: Cell<u64>,
}

/// Ordered list of change listeners
#[derive(Default)]
pub struct Emitter {
    listeners: Rc<Listeners>,
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a listener
    ///
    /// The listener stays subscribed until [`Subscription::remove`] is called;
    /// dropping the handle does not unsubscribe.
    pub fn add_listener<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + 'static,
    {
        let id = self.listeners.next_id.get();
        self.listeners.next_id.set(id + 1);
        self.listeners
            .entries
            .borrow_mut()
            .push((id, Rc::new(listener)));
        Subscription {
            id,
            listeners: Rc::downgrade(&self.listeners),
        }
    }

    /// Invoke every listener in subscription order
    ///
    /// Works on a snapshot: listeners added or removed while emitting take
    /// effect from the next emit.
    pub fn emit(&self) {
        let snapshot: Vec<Listener> = self
            .listeners
            .entries
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();

        for listener in snapshot {
            listener();
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.entries.borrow().len()
    }
}

/// Handle for removing a listener from its [`Emitter`]
pub struct Subscription {
    id: u64,
    listeners: Weak<Listeners>,
}

impl Subscription {
    /// Detach the listener. Returns `false` if it was already removed.
    pub fn remove(&self) -> bool {
        let Some(listeners) = self.listeners.upgrade() else {
            return false;
        };
        let mut entries = listeners.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|(id, _)| *id != self.id);
        entries.len() != before
    }

    /// Whether the listener is still subscribed
    pub fn is_active(&self) -> bool {
        self.listeners
            .upgrade()
            .is_some_and(|l| l.entries.borrow().iter().any(|(id, _)| *id == self.id))
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
