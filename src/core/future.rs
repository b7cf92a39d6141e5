//! Future glue for action chains.
//!
//! Mapping and chaining come straight from `futures_util`
//! (`map_ok`, `and_then`, `then`); this module adds the pieces specific to
//! actions: the boxed alias, ready-made futures and outcome observers.
use std::future::Future;

use futures_util::{FutureExt, future::BoxFuture};

use crate::core::{error::ActionError, result::ActionResult};

/// Single-completion asynchronous value flowing through a chain.
pub type ActionFuture<T = ActionResult> = BoxFuture<'static, Result<T, ActionError>>;

/// An already completed, successful future.
pub fn successful<T: Send + 'static>(value: T) -> ActionFuture<T> {
    futures_util::future::ready(Ok(value)).boxed()
}

/// An already completed, failed future.
pub fn failed<T: Send + 'static>(error: impl Into<ActionError>) -> ActionFuture<T> {
    futures_util::future::ready(Err(error.into())).boxed()
}

/// Combinators on fallible action futures.
pub trait ActionFutureExt<T>: Future<Output = Result<T, ActionError>> + Send + Sized + 'static
where
    T: Send + 'static,
{
    /// Turn any failure into a value. The resulting future cannot fail.
    fn recover_with<F>(self, f: F) -> BoxFuture<'static, T>
    where
        F: FnOnce(ActionError) -> T + Send + 'static,
    {
        self.map(|outcome| outcome.unwrap_or_else(f)).boxed()
    }

    /// Observe the outcome once it is known, passing it through untouched.
    fn on_complete<F>(self, f: F) -> ActionFuture<T>
    where
        F: FnOnce(&Result<T, ActionError>) + Send + 'static,
    {
        self.map(|outcome| {
            f(&outcome);
            outcome
        })
        .boxed()
    }
}

impl<T, Fut> ActionFutureExt<T> for Fut
where
    T: Send + 'static,
    Fut: Future<Output = Result<T, ActionError>> + Send + 'static,
{
}

/// Conversion for the return value of synchronous terminal blocks.
pub trait IntoOutcome {
    fn into_outcome(self) -> Result<ActionResult, ActionError>;
}

impl IntoOutcome for ActionResult {
    fn into_outcome(self) -> Result<ActionResult, ActionError> {
        Ok(self)
    }
}

impl<E> IntoOutcome for Result<ActionResult, E>
where
    E: Into<ActionError>,
{
    fn into_outcome(self) -> Result<ActionResult, ActionError> {
        self.map_err(Into::into)
    }
}
