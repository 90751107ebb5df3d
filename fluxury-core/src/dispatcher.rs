//! Synchronous flux dispatcher with `wait_for` ordering
//!
//! The dispatcher broadcasts every action to all registered callbacks in
//! registration order. A callback may call [`Dispatcher::wait_for`] to force
//! other callbacks to run first within the same broadcast. Each callback runs
//! at most once per dispatch, and a `wait_for` chain that loops back onto a
//! running callback fails with [`DispatchError::CyclicDependency`].
//!
//! # Example
//!
//! ```
//! use fluxury_core::{Dispatcher, Message};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let dispatcher: Dispatcher<Message> = Dispatcher::new();
//! let order = Rc::new(RefCell::new(Vec::new()));
//!
//! let first = Rc::new(RefCell::new(None));
//! let second = {
//!     let (order, first) = (order.clone(), first.clone());
//!     dispatcher.register(move |_action: &Message, dispatcher: &Dispatcher<Message>| {
//!         let token = first.borrow().expect("registered");
//!         dispatcher.wait_for(&[token])?;
//!         order.borrow_mut().push("second");
//!         Ok(())
//!     })
//! };
//! let token = {
//!     let order = order.clone();
//!     dispatcher.register(move |_action: &Message, _: &Dispatcher<Message>| {
//!         order.borrow_mut().push("first");
//!         Ok(())
//!     })
//! };
//! *first.borrow_mut() = Some(token);
//!
//! dispatcher.dispatch(Message::new("PING")).unwrap();
//! assert_eq!(*order.borrow(), vec!["first", "second"]);
//! # let _ = second;
//! ```
//!
//! # Threading
//!
//! A dispatcher is a single-threaded, `!Send` handle. Cloning it yields
//! another handle to the same registry. No internal borrow is held while a
//! callback runs, so callbacks may read stores, register new callbacks, and
//! call `wait_for` freely.

use crate::error::DispatchError;
use crate::middleware::{ComposedMiddleware, Middleware};
use crate::Action;
use bitflags::bitflags;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace, warn};

/// Opaque identifier returned by [`Dispatcher::register`]
///
/// Tokens are allocated from a monotonically increasing counter and never
/// reused, so ordering tokens orders registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DispatchToken(u64);

impl DispatchToken {
    /// Numeric id behind the token
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DispatchToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ID_{}", self.0)
    }
}

bitflags! {
    /// Per-dispatch bookkeeping for one callback
    ///
    /// Reset to empty at the start of every dispatch. A callback that failed
    /// keeps `PENDING` without `HANDLED` until the next dispatch begins.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CallbackStatus: u8 {
        /// The callback has been entered this round
        const PENDING = 1 << 0;
        /// The callback returned successfully this round
        const HANDLED = 1 << 1;
    }
}

/// Callback signature accepted by [`Dispatcher::register`]
pub type Callback<A> = dyn Fn(&A, &Dispatcher<A>) -> Result<(), DispatchError>;

struct Registry<A: Action> {
    callbacks: BTreeMap<DispatchToken, Rc<Callback<A>>>,
    statuses: HashMap<DispatchToken, CallbackStatus>,
    next_id: u64,
}

struct Inner<A: Action> {
    registry: RefCell<Registry<A>>,
    pending_action: RefCell<Option<Rc<A>>>,
    dispatching: Cell<bool>,
    middleware: RefCell<ComposedMiddleware<A>>,
}

/// Central hub broadcasting actions to registered callbacks
pub struct Dispatcher<A: Action> {
    inner: Rc<Inner<A>>,
}

impl<A: Action> Clone for Dispatcher<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A: Action> Default for Dispatcher<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Action> fmt::Debug for Dispatcher<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("callbacks", &self.len())
            .field("dispatching", &self.is_dispatching())
            .finish()
    }
}

impl<A: Action> Dispatcher<A> {
    /// Create an empty dispatcher
    pub fn new() -> Self {
        Self {
            inner: Rc::new(Inner {
                registry: RefCell::new(Registry {
                    callbacks: BTreeMap::new(),
                    statuses: HashMap::new(),
                    next_id: 1,
                }),
                pending_action: RefCell::new(None),
                dispatching: Cell::new(false),
                middleware: RefCell::new(ComposedMiddleware::new()),
            }),
        }
    }

    /// Attach a middleware (builder style)
    pub fn with_middleware<M: Middleware<A> + 'static>(self, middleware: M) -> Self {
        self.add_middleware(middleware);
        self
    }

    /// Attach a middleware to an existing dispatcher
    ///
    /// # Panics
    /// When called from inside a middleware hook.
    pub fn add_middleware<M: Middleware<A> + 'static>(&self, middleware: M) {
        self.inner.middleware.borrow_mut().add(middleware);
    }

    /// Register a callback to be invoked with every dispatched action
    ///
    /// Callbacks registered while a dispatch is in flight are not invoked by
    /// that dispatch, though `wait_for` may still pull them in.
    pub fn register<F>(&self, callback: F) -> DispatchToken
    where
        F: Fn(&A, &Dispatcher<A>) -> Result<(), DispatchError> + 'static,
    {
        let mut registry = self.inner.registry.borrow_mut();
        let token = DispatchToken(registry.next_id);
        registry.next_id += 1;
        registry.callbacks.insert(token, Rc::new(callback));
        registry.statuses.insert(token, CallbackStatus::empty());
        trace!(%token, "Registered callback");
        token
    }

    /// Remove a callback
    pub fn unregister(&self, token: DispatchToken) -> Result<(), DispatchError> {
        let mut registry = self.inner.registry.borrow_mut();
        if registry.callbacks.remove(&token).is_none() {
            return Err(DispatchError::UnknownToken { token });
        }
        registry.statuses.remove(&token);
        trace!(%token, "Unregistered callback");
        Ok(())
    }

    /// Number of registered callbacks
    pub fn len(&self) -> usize {
        self.inner.registry.borrow().callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a dispatch is in flight
    pub fn is_dispatching(&self) -> bool {
        self.inner.dispatching.get()
    }

    /// Bookkeeping for `token` as of the current or most recent dispatch
    pub fn status(&self, token: DispatchToken) -> Option<CallbackStatus> {
        self.inner.registry.borrow().statuses.get(&token).copied()
    }

    /// Broadcast an action to every registered callback
    ///
    /// Fails with [`DispatchError::ReentrantDispatch`] when called from inside
    /// a callback or a middleware hook. Any callback error aborts the
    /// broadcast and is returned here; the dispatcher is ready for the next
    /// dispatch either way.
    pub fn dispatch(&self, action: A) -> Result<(), DispatchError> {
        if self.is_dispatching() {
            warn!(action = %action.name(), "Rejected dispatch in the middle of a dispatch");
            return Err(DispatchError::ReentrantDispatch);
        }

        let action = Rc::new(action);
        // Middleware hooks run inside the cycle so they see it as in flight
        let _cycle = DispatchCycle::start(&self.inner, Rc::clone(&action));
        self.inner.middleware.borrow_mut().before(&action);

        debug!(action = %action.name(), callbacks = self.len(), "Dispatch started");
        let result = self.invoke_all();

        match &result {
            Ok(()) => debug!(action = %action.name(), "Dispatch finished"),
            Err(error) => warn!(action = %action.name(), %error, "Dispatch failed"),
        }
        self.inner.middleware.borrow_mut().after(&action, &result);
        result
    }

    /// Run the callbacks for `tokens` before continuing the current callback
    ///
    /// Tokens already handled this round are skipped. A token whose callback
    /// is still running (the caller itself, or something up its `wait_for`
    /// chain) fails with [`DispatchError::CyclicDependency`].
    pub fn wait_for(&self, tokens: &[DispatchToken]) -> Result<(), DispatchError> {
        if !self.is_dispatching() {
            return Err(DispatchError::NotDispatching);
        }

        for &token in tokens {
            let status = self
                .status(token)
                .ok_or(DispatchError::UnknownToken { token })?;

            if status.contains(CallbackStatus::HANDLED) {
                continue;
            }
            if status.contains(CallbackStatus::PENDING) {
                warn!(%token, "Circular dependency in wait_for");
                return Err(DispatchError::CyclicDependency { token });
            }

            trace!(%token, "Pulling callback forward");
            self.invoke(token)?;
        }
        Ok(())
    }

    fn invoke_all(&self) -> Result<(), DispatchError> {
        let tokens: Vec<DispatchToken> = self
            .inner
            .registry
            .borrow()
            .callbacks
            .keys()
            .copied()
            .collect();

        for token in tokens {
            match self.status(token) {
                // Unregistered by an earlier callback this round
                None => continue,
                Some(status) if status.contains(CallbackStatus::HANDLED) => continue,
                Some(_) => self.invoke(token)?,
            }
        }
        Ok(())
    }

    fn invoke(&self, token: DispatchToken) -> Result<(), DispatchError> {
        let (callback, action) = {
            let mut registry = self.inner.registry.borrow_mut();
            let callback = registry
                .callbacks
                .get(&token)
                .cloned()
                .ok_or(DispatchError::UnknownToken { token })?;
            let action = self
                .inner
                .pending_action
                .borrow()
                .clone()
                .ok_or(DispatchError::NotDispatching)?;

            let status = registry.statuses.entry(token).or_default();
            if status.contains(CallbackStatus::PENDING) {
                return Err(DispatchError::CyclicDependency { token });
            }
            status.insert(CallbackStatus::PENDING);
            (callback, action)
        };

        trace!(%token, action = %action.name(), "Invoking callback");
        callback(&*action, self)?;

        if let Some(status) = self.inner.registry.borrow_mut().statuses.get_mut(&token) {
            status.insert(CallbackStatus::HANDLED);
        }
        Ok(())
    }
}

/// Marks a dispatch in flight; clears it on drop, including on unwind
struct DispatchCycle<'a, A: Action> {
    inner: &'a Inner<A>,
}

impl<'a, A: Action> DispatchCycle<'a, A> {
    fn start(inner: &'a Inner<A>, action: Rc<A>) -> Self {
        for status in inner.registry.borrow_mut().statuses.values_mut() {
            *status = CallbackStatus::empty();
        }
        *inner.pending_action.borrow_mut() = Some(action);
        inner.dispatching.set(true);
        Self { inner }
    }
}

impl<A: Action> Drop for DispatchCycle<'_, A> {
    fn drop(&mut self) {
        self.inner.pending_action.borrow_mut().take();
        self.inner.dispatching.set(false);
    }
}
