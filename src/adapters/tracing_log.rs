use std::time::Duration;

use crate::{core::RequestContext, ports::action_log::ActionLog};

/// [`ActionLog`] adapter writing through `tracing`.
#[derive(Debug, Clone, Default)]
pub struct TracingActionLog;

impl TracingActionLog {
    pub fn new() -> Self {
        Self
    }
}

impl ActionLog for TracingActionLog {
    fn before(&self, ctx: &RequestContext) {
        tracing::info!("[Log] before action -> {}", ctx.request().uri);
    }

    fn after(&self, ctx: &RequestContext, elapsed: Duration) {
        tracing::info!(
            elapsed_ms = elapsed.as_millis() as u64,
            "[Log] after action -> {} : took {}",
            ctx.request().uri,
            human_duration(elapsed)
        );
    }
}

/// Millisecond-precision human readable duration, e.g. `1s 250ms`.
fn human_duration(elapsed: Duration) -> String {
    let millis = Duration::from_millis(elapsed.as_millis() as u64);
    if millis.is_zero() {
        "0ms".to_string()
    } else {
        humantime::format_duration(millis).to_string()
    }
}
