//! Middleware hooks around each dispatch

use crate::error::DispatchError;
use crate::Action;

/// Middleware trait for observing dispatches
///
/// Implement this trait to add logging, recording, or other
/// cross-cutting concerns to a dispatcher. Both hooks run while the
/// dispatch is in flight: a hook that dispatches through a cloned
/// [`Dispatcher`](crate::Dispatcher) gets
/// [`DispatchError::ReentrantDispatch`] back.
pub trait Middleware<A: Action> {
    /// Called before the action is broadcast to any handler
    fn before(&mut self, action: &A);

    /// Called after the broadcast finished or failed
    fn after(&mut self, action: &A, result: &Result<(), DispatchError>);
}

/// A no-op middleware that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMiddleware;

impl<A: Action> Middleware<A> for NoopMiddleware {
    fn before(&mut self, _action: &A) {}
    fn after(&mut self, _action: &A, _result: &Result<(), DispatchError>) {}
}

/// Compose multiple middleware into a single middleware
pub struct ComposedMiddleware<A: Action> {
    middlewares: Vec<Box<dyn Middleware<A>>>,
}

impl<A: Action> std::fmt::Debug for ComposedMiddleware<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposedMiddleware")
            .field("middlewares_count", &self.middlewares.len())
            .finish()
    }
}

impl<A: Action> Default for ComposedMiddleware<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Action> ComposedMiddleware<A> {
    /// Create a new composed middleware
    pub fn new() -> Self {
        Self {
            middlewares: Vec::new(),
        }
    }

    /// Add a middleware to the composition
    pub fn add<M: Middleware<A> + 'static>(&mut self, middleware: M) {
        self.middlewares.push(Box::new(middleware));
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }
}

impl<A: Action> Middleware<A> for ComposedMiddleware<A> {
    fn before(&mut self, action: &A) {
        for middleware in &mut self.middlewares {
            middleware.before(action);
        }
    }

    fn after(&mut self, action: &A, result: &Result<(), DispatchError>) {
        // Reverse order for proper nesting
        for middleware in self.middlewares.iter_mut().rev() {
            middleware.after(action, result);
        }
    }
}
