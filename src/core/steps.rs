//! Ready-made steps for common cross-cutting concerns.
use std::{sync::Arc, time::Instant};

use futures_util::FutureExt;
use http::{HeaderName, HeaderValue};

use crate::{
    core::{context::ContextKey, future::successful, result::ActionResult, step::ActionStep},
    ports::action_log::ActionLog,
};

/// When the timed section of the chain was entered.
pub const START: ContextKey<Instant> = ContextKey::new("start");

/// Identifier generated by [`request_id`].
pub const REQUEST_ID: ContextKey<String> = ContextKey::new("request_id");

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Record the start instant and report the request to `log`.
pub fn log_before(log: Arc<dyn ActionLog>) -> ActionStep {
    ActionStep::new(move |ctx, next| {
        log.before(&ctx);
        next(ctx.with_value(START, Instant::now()))
    })
}

/// Report the elapsed time since [`START`] once the rest of the chain is done.
///
/// Without a preceding [`log_before`] the read of [`START`] fails and the
/// request ends as a context-access fault, unless the chain had already
/// failed: that earlier error is kept.
pub fn log_after(log: Arc<dyn ActionLog>) -> ActionStep {
    ActionStep::new(move |ctx, next| {
        let log = log.clone();
        next(ctx.clone())
            .map(move |outcome| match ctx.get_value(&START) {
                Ok(start) => {
                    log.after(&ctx, start.elapsed());
                    outcome
                }
                Err(e) => match outcome {
                    Err(error) => {
                        tracing::warn!("Cannot time failed action for {}: {}", ctx.path(), e);
                        Err(error)
                    }
                    Ok(_) => Err(e.into()),
                },
            })
            .boxed()
    })
}

/// [`log_before`] followed by [`log_after`]: times everything nested inside.
pub fn logged(log: Arc<dyn ActionLog>) -> ActionStep {
    log_before(log.clone()).and_then(log_after(log))
}

/// Tag the request with a fresh UUID, exposed to later steps under
/// [`REQUEST_ID`] and to the client as `x-request-id`.
pub fn request_id() -> ActionStep {
    ActionStep::new(|ctx, next| {
        let id = uuid::Uuid::new_v4().to_string();
        match HeaderValue::from_str(&id) {
            Ok(value) => {
                ctx.insert_response_header(HeaderName::from_static(REQUEST_ID_HEADER), value)
            }
            Err(e) => tracing::warn!("Invalid request id header value {}: {}", id, e),
        }
        next(ctx.with_value(REQUEST_ID, id))
    })
}

/// Reject with 401 unless the request carries `header`.
pub fn require_header(header: &'static str) -> ActionStep {
    ActionStep::new(move |ctx, next| {
        if ctx.header(header).is_some() {
            next(ctx)
        } else {
            tracing::debug!("Rejecting {}: missing {} header", ctx.path(), header);
            successful(ActionResult::unauthorized().text(format!("Missing {header} header\n")))
        }
    })
}

#[cfg(test)]
mod tests {
    use std::{sync::Mutex, time::Duration};

    use http::{Request, StatusCode};

    use super::*;
    use crate::core::RequestContext;

    #[derive(Default)]
    struct RecordingLog {
        befores: Mutex<usize>,
        afters: Mutex<Vec<Duration>>,
    }

    impl ActionLog for RecordingLog {
        fn before(&self, _ctx: &RequestContext) {
            *self.befores.lock().unwrap() += 1;
        }

        fn after(&self, _ctx: &RequestContext, elapsed: Duration) {
            self.afters.lock().unwrap().push(elapsed);
        }
    }

    #[tokio::test]
    async fn test_logged_reports_once() {
        let log = Arc::new(RecordingLog::default());
        let result = logged(log.clone())
            .sync(|_ctx| ActionResult::ok().text("Hello World!\n"))
            .run()
            .await;

        assert_eq!(result.body_text(), Some("Hello World!\n"));
        assert_eq!(*log.befores.lock().unwrap(), 1);
        assert_eq!(log.afters.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_log_after_alone_is_a_context_fault() {
        let log = Arc::new(RecordingLog::default());
        let result = log_after(log.clone())
            .sync(|_ctx| ActionResult::ok())
            .run()
            .await;

        assert_eq!(result.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(result.body_text().unwrap().contains("start"));
        assert!(log.afters.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_log_after_alone_keeps_downstream_error() {
        let log = Arc::new(RecordingLog::default());
        let result = log_after(log.clone())
            .asynchronous(|_ctx| async {
                Err::<ActionResult, _>(crate::core::ActionError::msg("db down"))
            })
            .run()
            .await;

        assert_eq!(result.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(result.body_text(), Some(r#"{"error":"db down"}"#));
        assert!(log.afters.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_request_id_is_stored_and_exposed() {
        let ctx = RequestContext::empty();
        let result = request_id()
            .sync(|ctx| {
                let id = ctx.get_value(&REQUEST_ID)?;
                Ok::<_, crate::core::ActionError>(ActionResult::ok().text(id))
            })
            .with_context(ctx.clone())
            .run()
            .await;

        let header = ctx.response_headers();
        let id = header.get(REQUEST_ID_HEADER).unwrap().to_str().unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
        assert_eq!(result.body_text(), Some(id));
    }

    #[tokio::test]
    async fn test_require_header() {
        let action = require_header("x-api-key").sync(|_ctx| ActionResult::ok().text("secret"));

        let rejected = action.run().await;
        assert_eq!(rejected.status(), StatusCode::UNAUTHORIZED);

        let (parts, ()) = Request::builder()
            .header("x-api-key", "k")
            .body(())
            .unwrap()
            .into_parts();
        let accepted = action
            .with_context(RequestContext::new(parts, Default::default()))
            .run()
            .await;
        assert_eq!(accepted.status(), StatusCode::OK);
        assert_eq!(accepted.body_text(), Some("secret"));
    }
}
