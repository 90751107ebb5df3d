//! Named state containers driven by a dispatcher
//!
//! A [`Store`] registers one callback with a [`Dispatcher`]. On every
//! dispatch the callback runs the store's reducer; when the reducer hands
//! back a different `Arc` than it was given, the new snapshot replaces the
//! old one and the store's listeners are notified.
//!
//! # Example
//! ```
//! use fluxury_core::{Dispatcher, Message, Reducer, Store};
//! use std::sync::Arc;
//!
//! let dispatcher = Dispatcher::new();
//! let counter = Store::new(&dispatcher, "Counter", 0i64, Reducer::pure(
//!     |state: &Arc<i64>, action: &Message| match action.kind.as_str() {
//!         "INC" => Arc::new(**state + 1),
//!         "DEC" => Arc::new(**state - 1),
//!         _ => Arc::clone(state),
//!     },
//! ));
//!
//! for kind in ["INC", "INC", "DEC"] {
//!     dispatcher.dispatch(Message::new(kind)).unwrap();
//! }
//! assert_eq!(*counter.get_state(), 1);
//! ```

use crate::dispatcher::{DispatchToken, Dispatcher};
use crate::emitter::{Emitter, Subscription};
use crate::error::{DispatchError, StoreError};
use crate::Action;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use tracing::trace;

/// Full reducer signature: may wait on other stores before reducing
pub type ReduceFn<S, A> =
    dyn Fn(&Arc<S>, &A, &WaitFor<'_, A>) -> Result<Arc<S>, DispatchError>;

/// Per-action-type reducer case
pub type CaseFn<S, A> = dyn Fn(&Arc<S>, &A) -> Arc<S>;

/// Named accessor evaluated against the live state
pub type MethodFn<S> = dyn Fn(&S, &[Value]) -> Value;

/// Restricted view of the dispatcher handed to reducers
///
/// Only exposes [`wait_for`](Dispatcher::wait_for); reducers cannot dispatch
/// or register through it.
pub struct WaitFor<'a, A: Action> {
    dispatcher: &'a Dispatcher<A>,
}

impl<'a, A: Action> WaitFor<'a, A> {
    pub fn new(dispatcher: &'a Dispatcher<A>) -> Self {
        Self { dispatcher }
    }

    /// Make sure the stores behind `tokens` have reduced this action first
    pub fn wait(&self, tokens: &[DispatchToken]) -> Result<(), DispatchError> {
        self.dispatcher.wait_for(tokens)
    }
}

/// Reducer cases keyed by action name
pub struct Cases<S, A: Action> {
    cases: HashMap<String, Box<CaseFn<S, A>>>,
}

impl<S, A: Action> Default for Cases<S, A> {
    fn default() -> Self {
        Self {
            cases: HashMap::new(),
        }
    }
}

impl<S, A: Action> Cases<S, A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle actions named `kind`. A later case for the same name replaces
    /// the earlier one.
    pub fn on<F>(mut self, kind: impl Into<String>, case: F) -> Self
    where
        F: Fn(&Arc<S>, &A) -> Arc<S> + 'static,
    {
        self.cases.insert(kind.into(), Box::new(case));
        self
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

/// The two shapes a store reducer may take
pub enum Reducer<S, A: Action> {
    /// A single function over every action
    Function(Box<ReduceFn<S, A>>),
    /// One case per action name; unmatched names leave state untouched
    Mapping(Cases<S, A>),
}

impl<S: 'static, A: Action> Reducer<S, A> {
    /// Reducer that may call `wait_for` and fail
    pub fn function<F>(reduce: F) -> Self
    where
        F: Fn(&Arc<S>, &A, &WaitFor<'_, A>) -> Result<Arc<S>, DispatchError> + 'static,
    {
        Self::Function(Box::new(reduce))
    }

    /// Reducer with no dependencies on other stores
    pub fn pure<F>(reduce: F) -> Self
    where
        F: Fn(&Arc<S>, &A) -> Arc<S> + 'static,
    {
        Self::Function(Box::new(
            move |state: &Arc<S>, action: &A, _: &WaitFor<'_, A>| Ok(reduce(state, action)),
        ))
    }

    fn into_fn(self) -> Box<ReduceFn<S, A>> {
        match self {
            Self::Function(reduce) => reduce,
            Self::Mapping(Cases { cases }) => {
                Box::new(
                    move |state: &Arc<S>, action: &A, _: &WaitFor<'_, A>| {
                        match cases.get(action.name()) {
                            Some(case) => Ok(case(state, action)),
                            None => Ok(Arc::clone(state)),
                        }
                    },
                )
            }
        }
    }
}

impl<S: 'static, A: Action> From<Cases<S, A>> for Reducer<S, A> {
    fn from(cases: Cases<S, A>) -> Self {
        Self::Mapping(cases)
    }
}

/// Named accessors bound to a store's state
pub struct Methods<S> {
    entries: Vec<(String, Box<MethodFn<S>>)>,
}

impl<S> Default for Methods<S> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<S> Methods<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an accessor. Redeclaring a name replaces it in place.
    pub fn method<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(&S, &[Value]) -> Value + 'static,
    {
        let name = name.into();
        let method: Box<MethodFn<S>> = Box::new(method);
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = method,
            None => self.entries.push((name, method)),
        }
        self
    }

    fn get(&self, name: &str) -> Option<&MethodFn<S>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, m)| m.as_ref())
    }
}

struct StoreInner<S> {
    name: String,
    state: RefCell<Arc<S>>,
    emitter: Emitter,
    methods: Methods<S>,
}

/// Handle to a registered store
///
/// Clones share the same state, listeners and registration. Name, token,
/// reducer and methods are fixed at construction.
pub struct Store<S, A: Action> {
    inner: Rc<StoreInner<S>>,
    dispatch_token: DispatchToken,
    _action: std::marker::PhantomData<fn(&A)>,
}

impl<S, A: Action> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            dispatch_token: self.dispatch_token,
            _action: std::marker::PhantomData,
        }
    }
}

impl<S, A: Action> fmt::Debug for Store<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.inner.name)
            .field("dispatch_token", &self.dispatch_token)
            .field("listeners", &self.inner.emitter.listener_count())
            .finish()
    }
}

impl<S: 'static, A: Action> Store<S, A> {
    /// Create a store and register it with `dispatcher`
    pub fn new(
        dispatcher: &Dispatcher<A>,
        name: impl Into<String>,
        initial_state: S,
        reducer: impl Into<Reducer<S, A>>,
    ) -> Self {
        Self::with_methods(dispatcher, name, initial_state, reducer, Methods::new())
    }

    /// Create a store with named accessor methods
    pub fn with_methods(
        dispatcher: &Dispatcher<A>,
        name: impl Into<String>,
        initial_state: S,
        reducer: impl Into<Reducer<S, A>>,
        methods: Methods<S>,
    ) -> Self {
        let inner = Rc::new(StoreInner {
            name: name.into(),
            state: RefCell::new(Arc::new(initial_state)),
            emitter: Emitter::new(),
            methods,
        });
        let reduce = reducer.into().into_fn();

        let handler_inner = Rc::clone(&inner);
        let dispatch_token = dispatcher.register(move |action: &A, dispatcher: &Dispatcher<A>| {
            let current = Arc::clone(&handler_inner.state.borrow());
            let next = reduce(&current, action, &WaitFor::new(dispatcher))?;
            if Arc::ptr_eq(&current, &next) {
                return Ok(());
            }

            *handler_inner.state.borrow_mut() = next;
            trace!(store = %handler_inner.name, action = %action.name(), "State changed");
            handler_inner.emitter.emit();
            Ok(())
        });

        Self {
            inner,
            dispatch_token,
            _action: std::marker::PhantomData,
        }
    }
}

impl<S, A: Action> Store<S, A> {
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Token to pass to `wait_for` when another store depends on this one
    pub fn dispatch_token(&self) -> DispatchToken {
        self.dispatch_token
    }

    /// Current snapshot. Holding it keeps it valid after later dispatches.
    pub fn get_state(&self) -> Arc<S> {
        Arc::clone(&self.inner.state.borrow())
    }

    /// Evaluate `f` against the current state
    pub fn select<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(self.get_state().as_ref())
    }

    /// Subscribe to state changes
    pub fn add_listener<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + 'static,
    {
        self.inner.emitter.add_listener(listener)
    }

    pub fn listener_count(&self) -> usize {
        self.inner.emitter.listener_count()
    }

    /// Invoke a named accessor with the current state prepended
    pub fn call(&self, method: &str, args: &[Value]) -> Result<Value, StoreError> {
        let accessor = self
            .inner
            .methods
            .get(method)
            .ok_or_else(|| StoreError::UnknownMethod {
                store: self.inner.name.clone(),
                method: method.to_string(),
            })?;
        let state = self.get_state();
        Ok(accessor(state.as_ref(), args))
    }

    /// Accessor names in declaration order
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.inner.methods.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn has_method(&self, method: &str) -> bool {
        self.inner.methods.get(method).is_some()
    }
}
