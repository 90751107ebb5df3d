//! Core dispatcher and stores for fluxury
//!
//! This crate provides a synchronous, single-threaded flux architecture:
//! one dispatcher broadcasts actions to independently registered stores,
//! and each store derives its next immutable state with a reducer.
//!
//! # Core Concepts
//!
//! - **Action**: A named message broadcast to every store
//! - **Dispatcher**: Ordered broadcast with `wait_for` dependencies and cycle detection
//! - **Store**: Named state snapshot, reducer, accessors and change listeners
//! - **Emitter**: Payload-free change notification channel
//! - **Middleware**: Hooks around every dispatch (logging, recording)
//!
//! # Basic Example
//!
//! ```
//! use fluxury_core::prelude::*;
//! use std::sync::Arc;
//!
//! let flux = Flux::new();
//! let actions = create_actions(["INC", "DEC"]);
//!
//! let counter = flux.create_store(
//!     "Counter",
//!     0i64,
//!     Cases::new()
//!         .on(&actions["INC"], |s: &Arc<i64>, _: &Message| Arc::new(**s + 1))
//!         .on(&actions["DEC"], |s: &Arc<i64>, _: &Message| Arc::new(**s - 1)),
//! );
//!
//! flux.dispatch("INC").unwrap();
//! flux.dispatch("INC").unwrap();
//! flux.dispatch("DEC").unwrap();
//! assert_eq!(*counter.get_state(), 1);
//! ```
//!
//! # Store Dependencies
//!
//! A reducer can require another store to finish reducing the current action
//! before it reads that store's state:
//!
//! ```
//! use fluxury_core::prelude::*;
//! use std::sync::Arc;
//!
//! let flux = Flux::new();
//! let messages = flux.create_store(
//!     "MessageStore",
//!     Vec::<String>::new(),
//!     Cases::new().on("loadMessage", |s: &Arc<Vec<String>>, a: &Message| {
//!         let mut next = (**s).clone();
//!         next.extend(a.data_as::<String>().and_then(Result::ok));
//!         Arc::new(next)
//!     }),
//! );
//!
//! let source = messages.clone();
//! let count = flux.create_store(
//!     "MessageCountStore",
//!     0usize,
//!     Reducer::function(move |_: &Arc<usize>, _: &Message, wait_for: &WaitFor<'_, Message>| {
//!         wait_for.wait(&[source.dispatch_token()])?;
//!         Ok(Arc::new(source.get_state().len()))
//!     }),
//! );
//!
//! flux.dispatch_with("loadMessage", "Test").unwrap();
//! assert_eq!(*count.get_state(), 1);
//! ```

pub mod action;
pub mod dispatcher;
pub mod emitter;
pub mod error;
pub mod flux;
pub mod logging;
pub mod middleware;
pub mod store;
pub mod testing;

// Core exports
pub use action::{create_actions, Action, ActionTypes, Message};
pub use dispatcher::{Callback, CallbackStatus, DispatchToken, Dispatcher};
pub use emitter::{Emitter, Subscription};
pub use error::{DispatchError, StoreError};
pub use flux::Flux;

// Store exports
pub use store::{CaseFn, Cases, MethodFn, Methods, ReduceFn, Reducer, Store, WaitFor};

// Middleware exports
pub use logging::{glob_match, ActionLoggerConfig, LoggingMiddleware};
pub use middleware::{ComposedMiddleware, Middleware, NoopMiddleware};

// Testing exports
pub use testing::{ListenerProbe, RecordingMiddleware, TestHarness};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::action::{create_actions, Action, ActionTypes, Message};
    pub use crate::dispatcher::{DispatchToken, Dispatcher};
    pub use crate::emitter::Subscription;
    pub use crate::error::{DispatchError, StoreError};
    pub use crate::flux::Flux;
    pub use crate::logging::{ActionLoggerConfig, LoggingMiddleware};
    pub use crate::middleware::{Middleware, NoopMiddleware};
    pub use crate::store::{Cases, Methods, Reducer, Store, WaitFor};
}
