//! Error taxonomy for dispatching and store access

use crate::dispatcher::DispatchToken;
use std::error::Error as StdError;
use thiserror::Error;

/// Errors raised by the dispatcher, or by handlers running inside a dispatch
///
/// All of these are programmer errors surfaced synchronously to the caller.
/// None of them leave the dispatcher in a dispatching state.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// `dispatch` was called while another dispatch was in flight
    #[error("cannot dispatch in the middle of a dispatch")]
    ReentrantDispatch,

    /// `wait_for` named a callback that is still running
    #[error("circular dependency detected while waiting for {token}")]
    CyclicDependency { token: DispatchToken },

    /// `wait_for` was called outside of a dispatch
    #[error("wait_for must be invoked while dispatching")]
    NotDispatching,

    /// The token does not belong to a registered callback
    #[error("{token} does not map to a registered callback")]
    UnknownToken { token: DispatchToken },

    /// Malformed input to a dispatch entry point
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A handler or reducer failed for its own reasons
    #[error("handler failed: {0}")]
    Handler(#[source] Box<dyn StdError + 'static>),
}

impl DispatchError {
    /// Wrap an arbitrary reducer failure
    pub fn handler(err: impl Into<Box<dyn StdError + 'static>>) -> Self {
        Self::Handler(err.into())
    }
}

/// Errors raised by store accessors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store {store:?} has no method named {method:?}")]
    UnknownMethod { store: String, method: String },
}
