pub mod action;
pub mod context;
pub mod error;
pub mod executor;
pub mod future;
pub mod result;
pub mod step;
pub mod steps;
pub mod stream;

pub use action::Action;
pub use context::{ContextKey, RequestContext};
pub use error::{ActionError, ContextError};
pub use executor::Executor;
pub use future::{ActionFuture, ActionFutureExt, IntoOutcome};
pub use result::{ActionResult, ResultBody};
pub use step::{ActionStep, Next};
pub use stream::{CancelHandle, ChunkStream, Source};
