//! Top-level entry point bundling one dispatcher with its stores
//!
//! Construct a single [`Flux`] at startup and pass it (or clones of it) to
//! whatever creates stores. Independent instances never share callbacks,
//! which keeps tests isolated from each other.

use crate::action::{create_actions, ActionTypes, Message};
use crate::dispatcher::Dispatcher;
use crate::error::DispatchError;
use crate::middleware::Middleware;
use crate::store::{Methods, Reducer, Store};
use serde_json::Value;

/// A dispatcher for [`Message`] actions plus store construction helpers
#[derive(Debug, Clone, Default)]
pub struct Flux {
    dispatcher: Dispatcher<Message>,
}

impl Flux {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a middleware (builder style)
    pub fn with_middleware<M: Middleware<Message> + 'static>(self, middleware: M) -> Self {
        self.dispatcher.add_middleware(middleware);
        self
    }

    /// The underlying dispatcher
    pub fn dispatcher(&self) -> &Dispatcher<Message> {
        &self.dispatcher
    }

    /// Dispatch a message, or a bare type name with no payload
    pub fn dispatch(&self, message: impl Into<Message>) -> Result<(), DispatchError> {
        self.dispatcher.dispatch(message.into())
    }

    /// Dispatch `{ type, data }`
    pub fn dispatch_with(
        &self,
        kind: impl Into<String>,
        data: impl Into<Value>,
    ) -> Result<(), DispatchError> {
        self.dispatcher.dispatch(Message::with_data(kind, data))
    }

    /// Dispatch from untyped JSON
    ///
    /// A string dispatches a message of that type. An object needs a string
    /// `type` field and may carry `data`; `"data": null` counts as no payload.
    /// Objects with any other key, and every other shape, fail with
    /// [`DispatchError::InvalidArgument`] before any callback runs.
    pub fn dispatch_value(&self, value: Value) -> Result<(), DispatchError> {
        self.dispatcher.dispatch(Message::try_from(value)?)
    }

    /// Key-mirrored table of action names
    pub fn create_actions<I, S>(names: I) -> ActionTypes
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        create_actions(names)
    }

    /// Create a store registered with this instance's dispatcher
    pub fn create_store<S: 'static>(
        &self,
        name: impl Into<String>,
        initial_state: S,
        reducer: impl Into<Reducer<S, Message>>,
    ) -> Store<S, Message> {
        Store::new(&self.dispatcher, name, initial_state, reducer)
    }

    /// Create a store with named accessor methods
    pub fn create_store_with_methods<S: 'static>(
        &self,
        name: impl Into<String>,
        initial_state: S,
        reducer: impl Into<Reducer<S, Message>>,
        methods: Methods<S>,
    ) -> Store<S, Message> {
        Store::with_methods(&self.dispatcher, name, initial_state, reducer, methods)
    }
}
