//! The executable unit handed to the routing collaborator.
use std::{future::Future, sync::Arc};

use tracing::Instrument;

use crate::core::{
    context::RequestContext,
    error::ActionError,
    executor::Executor,
    future::{ActionFuture, ActionFutureExt, IntoOutcome},
    result::ActionResult,
    step::{ActionStep, Next},
};

/// Terminal block of an action.
pub(crate) type Block = dyn Fn(RequestContext) -> ActionFuture + Send + Sync;

/// A step chain bound to a context, a terminal block and an execution pool.
///
/// Builders never mutate: [`with_executor`](Self::with_executor) and
/// [`with_context`](Self::with_context) return new actions sharing the chain
/// and the block.
#[derive(Clone)]
pub struct Action {
    step: ActionStep,
    context: RequestContext,
    block: Arc<Block>,
    executor: Executor,
}

impl Action {
    pub(crate) fn from_parts(
        step: ActionStep,
        context: RequestContext,
        block: Arc<Block>,
        executor: Executor,
    ) -> Self {
        Self {
            step,
            context,
            block,
            executor,
        }
    }

    /// Synchronous terminal block with no surrounding steps.
    ///
    /// The block still runs on the execution pool, never inline.
    pub fn sync<F, R>(block: F) -> Self
    where
        F: Fn(&RequestContext) -> R + Send + Sync + 'static,
        R: IntoOutcome,
    {
        ActionStep::identity().sync(block)
    }

    /// Asynchronous terminal block with no surrounding steps.
    pub fn asynchronous<F, Fut>(block: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ActionResult, ActionError>> + Send + 'static,
    {
        ActionStep::identity().asynchronous(block)
    }

    /// Asynchronous terminal block scheduled on `executor`.
    pub fn asynchronous_on<F, Fut>(executor: Executor, block: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ActionResult, ActionError>> + Send + 'static,
    {
        ActionStep::identity().asynchronous_on(executor, block)
    }

    /// Same action on another pool. The last pool set wins.
    pub fn with_executor(&self, executor: Executor) -> Self {
        Self {
            executor,
            ..self.clone()
        }
    }

    /// Same action bound to another request context.
    pub fn with_context(&self, context: RequestContext) -> Self {
        Self {
            context,
            ..self.clone()
        }
    }

    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Execute the chain.
    ///
    /// The outermost step is invoked on the execution pool and the future it
    /// returns is awaited there too. Whatever goes wrong on the way (an error
    /// from any step or from the block, a panic, a bad context read) is turned
    /// into an error result here and only here, so the returned future always
    /// yields a well-formed [`ActionResult`].
    ///
    /// Every call is an independent execution against the same bound context.
    pub fn run(&self) -> impl Future<Output = ActionResult> + Send + use<> {
        let step = self.step.clone();
        let block = self.block.clone();
        let context = self.context.clone();
        let executor = self.executor.clone();

        let span = tracing::info_span!(
            "action",
            http.method = %context.request().method,
            http.path = context.path(),
            executor = executor.name(),
        );

        let scheduled = executor.spawn({
            let context = context.clone();
            async move {
                let next: Next = Box::new(move |ctx| block(ctx));
                step.invoke(context, next).await
            }
            .instrument(span.clone())
        });

        let path = context.path().to_string();
        async move {
            // keeps a dedicated pool alive until the chain has finished
            let _executor = executor;
            let handle = scheduled?;
            handle.await?
        }
        .recover_with(move |error| {
            tracing::error!(
                error.kind = error.kind(),
                "Action for {} failed: {}",
                path,
                error
            );
            error.into_result()
        })
        .instrument(span)
    }
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Action")
            .field("context", &self.context)
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}
