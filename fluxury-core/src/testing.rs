//! Test utilities for fluxury applications
//!
//! - [`TestHarness`]: a dispatcher that records every action it broadcasts
//! - [`ListenerProbe`]: counts change notifications from one or more stores
//! - Assertion macros for verifying recorded actions
//!
//! # Example
//!
//! ```
//! use fluxury_core::testing::{ListenerProbe, TestHarness};
//! use fluxury_core::{assert_dispatched, Message, Reducer, Store};
//! use std::sync::Arc;
//!
//! let mut harness = TestHarness::<Message>::new();
//! let store = Store::new(harness.dispatcher(), "Counter", 0, Reducer::pure(
//!     |s: &Arc<i32>, a: &Message| if a.kind == "INC" { Arc::new(**s + 1) } else { Arc::clone(s) },
//! ));
//! let probe = ListenerProbe::new();
//! probe.attach(&store);
//!
//! harness.dispatch(Message::new("INC")).unwrap();
//! harness.dispatch(Message::new("NOOP")).unwrap();
//!
//! let dispatched = harness.drain_dispatched();
//! assert_dispatched!(dispatched, Message { kind, .. } if kind == "INC");
//! assert_eq!(probe.count(), 1);
//! ```

use crate::dispatcher::Dispatcher;
use crate::emitter::Subscription;
use crate::error::DispatchError;
use crate::middleware::Middleware;
use crate::store::Store;
use crate::Action;
use std::cell::Cell;
use std::rc::Rc;
use tokio::sync::mpsc;

/// Middleware forwarding every broadcast action into a channel
#[derive(Debug, Clone)]
pub struct RecordingMiddleware<A> {
    tx: mpsc::UnboundedSender<A>,
}

impl<A> RecordingMiddleware<A> {
    pub fn new(tx: mpsc::UnboundedSender<A>) -> Self {
        Self { tx }
    }
}

impl<A: Action> Middleware<A> for RecordingMiddleware<A> {
    fn before(&mut self, action: &A) {
        let _ = self.tx.send(action.clone());
    }

    fn after(&mut self, _action: &A, _result: &Result<(), DispatchError>) {}
}

/// Dispatcher wrapper that records what it broadcasts.
///
/// Re-entrant dispatches are rejected before any middleware runs, so they
/// never show up in the record.
pub struct TestHarness<A: Action> {
    dispatcher: Dispatcher<A>,
    rx: mpsc::UnboundedReceiver<A>,
}

impl<A: Action> Default for TestHarness<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Action> TestHarness<A> {
    /// Create a harness around a fresh dispatcher
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let dispatcher = Dispatcher::new().with_middleware(RecordingMiddleware::new(tx));
        Self { dispatcher, rx }
    }

    /// The dispatcher to register stores against
    pub fn dispatcher(&self) -> &Dispatcher<A> {
        &self.dispatcher
    }

    pub fn dispatch(&self, action: A) -> Result<(), DispatchError> {
        self.dispatcher.dispatch(action)
    }

    /// Drain all recorded actions, oldest first
    pub fn drain_dispatched(&mut self) -> Vec<A> {
        let mut actions = Vec::new();
        while let Ok(action) = self.rx.try_recv() {
            actions.push(action);
        }
        actions
    }

    /// Check if any actions were recorded (drains them)
    pub fn has_dispatched(&mut self) -> bool {
        !self.drain_dispatched().is_empty()
    }
}

/// Shared counter for change notifications
#[derive(Debug, Clone, Default)]
pub struct ListenerProbe {
    count: Rc<Cell<usize>>,
}

impl ListenerProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe this probe to `store`
    pub fn attach<S, A: Action>(&self, store: &Store<S, A>) -> Subscription {
        store.add_listener(self.listener())
    }

    /// A listener closure that bumps this probe
    pub fn listener(&self) -> impl Fn() + 'static {
        let count = Rc::clone(&self.count);
        move || count.set(count.get() + 1)
    }

    /// Notifications seen so far
    pub fn count(&self) -> usize {
        self.count.get()
    }

    pub fn reset(&self) {
        self.count.set(0);
    }
}

/// Assert that an action matching a pattern was dispatched.
///
/// # Example
///
/// ```ignore
/// let actions = harness.drain_dispatched();
/// assert_dispatched!(actions, CounterAction::Increment);
/// ```
#[macro_export]
macro_rules! assert_dispatched {
    ($actions:expr, $pattern:pat $(if $guard:expr)?) => {
        assert!(
            $actions.iter().any(|a| matches!(a, $pattern $(if $guard)?)),
            "Expected action matching `{}` to be dispatched, but got: {:?}",
            stringify!($pattern),
            $actions
        );
    };
}

/// Assert that no action matching a pattern was dispatched.
#[macro_export]
macro_rules! assert_not_dispatched {
    ($actions:expr, $pattern:pat $(if $guard:expr)?) => {
        assert!(
            !$actions.iter().any(|a| matches!(a, $pattern $(if $guard)?)),
            "Expected action matching `{}` NOT to be dispatched, but it was: {:?}",
            stringify!($pattern),
            $actions
        );
    };
}

/// Find the first dispatched action matching a pattern.
#[macro_export]
macro_rules! find_dispatched {
    ($actions:expr, $pattern:pat $(if $guard:expr)?) => {
        $actions.iter().find(|a| matches!(a, $pattern $(if $guard)?))
    };
}

/// Count how many dispatched actions match a pattern.
#[macro_export]
macro_rules! count_dispatched {
    ($actions:expr, $pattern:pat $(if $guard:expr)?) => {
        $actions.iter().filter(|a| matches!(a, $pattern $(if $guard)?)).count()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    enum TestAction {
        Foo,
        Bar(i32),
    }

    impl crate::Action for TestAction {
        fn name(&self) -> &str {
            match self {
                TestAction::Foo => "Foo",
                TestAction::Bar(_) => "Bar",
            }
        }
    }

    #[test]
    fn test_harness_records_and_drains() {
        let mut harness = TestHarness::<TestAction>::new();

        harness.dispatch(TestAction::Foo).unwrap();
        harness.dispatch(TestAction::Bar(42)).unwrap();

        let actions = harness.drain_dispatched();
        assert_eq!(actions, vec![TestAction::Foo, TestAction::Bar(42)]);
        assert!(harness.drain_dispatched().is_empty());
    }

    #[test]
    fn test_harness_skips_rejected_reentrant_dispatch() {
        let mut harness = TestHarness::<TestAction>::new();
        harness.dispatcher().register(|action, d| match action {
            TestAction::Foo => d.dispatch(TestAction::Bar(1)),
            TestAction::Bar(_) => Ok(()),
        });

        assert!(harness.dispatch(TestAction::Foo).is_err());
        assert_eq!(harness.drain_dispatched(), vec![TestAction::Foo]);
    }

    #[test]
    fn test_assert_macros() {
        let actions = vec![TestAction::Foo, TestAction::Bar(42)];

        assert_dispatched!(actions, TestAction::Foo);
        assert_dispatched!(actions, TestAction::Bar(n) if *n > 40);
        assert_not_dispatched!(actions, TestAction::Bar(99));

        assert!(find_dispatched!(actions, TestAction::Bar(_)).is_some());
        assert_eq!(count_dispatched!(actions, TestAction::Bar(_)), 1);
    }

    #[test]
    fn test_probe_counts_and_resets() {
        let probe = ListenerProbe::new();
        let listener = probe.listener();
        listener();
        listener();
        assert_eq!(probe.count(), 2);
        probe.reset();
        assert_eq!(probe.count(), 0);
    }
}
