use std::time::Duration;

use crate::core::RequestContext;

/// ActionLog defines the port (interface) the timing steps report through.
///
/// Steps receive it explicitly instead of reaching for a global logger, so a
/// test can swap in a recording implementation.
pub trait ActionLog: Send + Sync + 'static {
    /// Called when a request enters the timed section of the chain
    ///
    /// # Arguments
    /// * `ctx` - The context of the request being handled
    fn before(&self, ctx: &RequestContext);

    /// Called once the rest of the chain has completed
    ///
    /// # Arguments
    /// * `ctx` - The context of the request being handled
    /// * `elapsed` - Time since the matching `before` call
    fn after(&self, ctx: &RequestContext, elapsed: Duration);
}
