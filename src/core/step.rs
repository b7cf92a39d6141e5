//! Composable middleware units.
use std::{future::Future, sync::Arc};

use futures_util::FutureExt;

use crate::core::{
    action::Action,
    context::RequestContext,
    executor::Executor,
    future::{ActionFuture, IntoOutcome},
    result::ActionResult,
};

/// "The rest of the chain". Being `FnOnce`, a step can call it at most once;
/// not calling it short-circuits everything downstream.
pub type Next = Box<dyn FnOnce(RequestContext) -> ActionFuture + Send>;

type StepFn = dyn Fn(RequestContext, Next) -> ActionFuture + Send + Sync;

/// One middleware layer: a function of `(context, next)` returning the
/// future result of the request.
///
/// Steps hold no per-request state and are shared freely between concurrent
/// executions. A step wanting "after" behavior attaches a continuation to the
/// future returned by `next` instead of waiting on it.
///
/// ```
/// use actionkit::{ActionResult, ActionStep};
///
/// let deny = ActionStep::new(|_ctx, _next| {
///     actionkit::core::future::successful(ActionResult::unauthorized())
/// });
/// let chain = ActionStep::identity().and_then(deny);
/// let _action = chain.sync(|_ctx| ActionResult::ok().text("never reached"));
/// ```
#[derive(Clone)]
pub struct ActionStep {
    inner: Arc<StepFn>,
}

impl ActionStep {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(RequestContext, Next) -> ActionFuture + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// The no-op step: hands the context straight to `next`.
    pub fn identity() -> Self {
        Self::new(|ctx, next| next(ctx))
    }

    /// Nest `other` inside `self`.
    ///
    /// `self` becomes the outer wrapper: its "before" logic runs first and its
    /// "after" logic last. Composition is associative.
    pub fn and_then(self, other: ActionStep) -> ActionStep {
        let outer = self.inner;
        ActionStep::new(move |ctx, next| {
            let inner = other.clone();
            outer(ctx, Box::new(move |ctx| inner.invoke(ctx, next)))
        })
    }

    /// Run this step with `next` as the rest of the chain.
    pub fn invoke(&self, ctx: RequestContext, next: Next) -> ActionFuture {
        (self.inner)(ctx, next)
    }

    /// Wrap a synchronous terminal block with this chain.
    pub fn sync<F, R>(&self, block: F) -> Action
    where
        F: Fn(&RequestContext) -> R + Send + Sync + 'static,
        R: IntoOutcome,
    {
        Action::from_parts(
            self.clone(),
            RequestContext::empty(),
            Arc::new(move |ctx: RequestContext| {
                futures_util::future::ready(block(&ctx).into_outcome()).boxed()
            }),
            Executor::ambient(),
        )
    }

    /// Wrap an asynchronous terminal block with this chain.
    pub fn asynchronous<F, Fut>(&self, block: F) -> Action
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ActionResult, crate::core::ActionError>> + Send + 'static,
    {
        self.asynchronous_on(Executor::ambient(), block)
    }

    /// Like [`asynchronous`](Self::asynchronous), scheduled on `executor`.
    pub fn asynchronous_on<F, Fut>(&self, executor: Executor, block: F) -> Action
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ActionResult, crate::core::ActionError>> + Send + 'static,
    {
        Action::from_parts(
            self.clone(),
            RequestContext::empty(),
            Arc::new(move |ctx: RequestContext| block(ctx).boxed()),
            executor,
        )
    }
}

impl Default for ActionStep {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::fmt::Debug for ActionStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionStep").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::core::future::{ActionFutureExt, successful};

    fn recording(name: &'static str, log: Arc<Mutex<Vec<String>>>) -> ActionStep {
        ActionStep::new(move |ctx, next| {
            log.lock().unwrap().push(format!("before {name}"));
            let log = log.clone();
            next(ctx).on_complete(move |_| log.lock().unwrap().push(format!("after {name}")))
        })
    }

    fn terminal(log: Arc<Mutex<Vec<String>>>) -> Next {
        Box::new(move |_ctx| {
            log.lock().unwrap().push("body".to_string());
            successful(ActionResult::ok())
        })
    }

    #[tokio::test]
    async fn test_identity_calls_next() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let result = ActionStep::identity()
            .invoke(RequestContext::empty(), terminal(log.clone()))
            .await
            .unwrap();
        assert_eq!(result.status(), http::StatusCode::OK);
        assert_eq!(*log.lock().unwrap(), vec!["body"]);
    }

    #[tokio::test]
    async fn test_and_then_nests_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = recording("a", log.clone()).and_then(recording("b", log.clone()));
        chain
            .invoke(RequestContext::empty(), terminal(log.clone()))
            .await
            .unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec!["before a", "before b", "body", "after b", "after a"]
        );
    }

    #[tokio::test]
    async fn test_short_circuit_skips_terminal() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let deny = ActionStep::new(|_ctx, _next| successful(ActionResult::unauthorized()));
        let result = deny
            .and_then(recording("inner", log.clone()))
            .invoke(RequestContext::empty(), terminal(log.clone()))
            .await
            .unwrap();
        assert_eq!(result.status(), http::StatusCode::UNAUTHORIZED);
        assert!(log.lock().unwrap().is_empty());
    }
}
