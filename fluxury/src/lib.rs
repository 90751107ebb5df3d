//! fluxury: unidirectional data flow with a synchronous flux dispatcher
//!
//! One dispatcher broadcasts actions to every store; each store reduces its
//! own immutable state and tells its listeners when that state changed.
//! Stores that depend on each other say so with `wait_for` instead of relying
//! on registration order.
//!
//! # Example
//! ```
//! use fluxury::prelude::*;
//! use std::sync::Arc;
//!
//! #[derive(Action, Clone, Debug)]
//! #[action(rename_all = "SCREAMING_SNAKE_CASE")]
//! enum CounterAction {
//!     Inc,
//!     Dec,
//! }
//!
//! let dispatcher = Dispatcher::new();
//! let counter = Store::new(&dispatcher, "Counter", 0i32, Reducer::pure(
//!     |state: &Arc<i32>, action: &CounterAction| match action {
//!         CounterAction::Inc => Arc::new(**state + 1),
//!         CounterAction::Dec => Arc::new(**state - 1),
//!     },
//! ));
//!
//! dispatcher.dispatch(CounterAction::Inc).unwrap();
//! assert_eq!(*counter.get_state(), 1);
//! assert_eq!(CounterAction::Dec.name(), "DEC");
//! ```

// Re-export everything from core
pub use fluxury_core::*;

// Re-export derive macros
pub use fluxury_macros::Action;

/// Prelude for convenient imports
pub mod prelude {
    // Traits and derive
    pub use fluxury_core::Action;
    pub use fluxury_macros::Action;

    // Dispatching
    pub use fluxury_core::{
        create_actions, ActionTypes, DispatchError, DispatchToken, Dispatcher, Flux, Message,
    };

    // Stores
    pub use fluxury_core::{Cases, Methods, Reducer, Store, StoreError, Subscription, WaitFor};

    // Middleware
    pub use fluxury_core::{ActionLoggerConfig, LoggingMiddleware, Middleware, NoopMiddleware};
}
