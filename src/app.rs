//! Demo routes served by the binary.
//!
//! | Route                     | Action                                               |
//! |---------------------------|------------------------------------------------------|
//! | `GET /api/hello`          | timed by [`steps::logged`], answers `Hello World!`   |
//! | `GET /api/sse`            | Server-Sent-Events ticker cancelled after a deadline |
//! | `GET /api/private`        | tagged with a request id, requires `x-api-key`       |
//! | `GET /api/websocket/{id}` | pushes `msg{id}` to the client on every tick         |
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    extract::{State, ws::WebSocketUpgrade},
    response::Response,
    routing::get,
};
use eyre::Result;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::{
    adapters::{Flow, TracingActionLog, WebSocketHandler, dispatch},
    config::models::{ServerConfig, StreamingConfig},
    core::{
        Action, ActionError, ActionResult, CancelHandle, Executor, RequestContext, Source,
        steps::{self, REQUEST_ID},
        stream::sse,
    },
    ports::action_log::ActionLog,
};

/// Header the private route requires.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Actions shared by every request. Cloning is cheap.
#[derive(Clone, Debug)]
pub struct AppState {
    hello: Action,
    sse: Action,
    private: Action,
    websocket: WebSocketHandler,
}

impl AppState {
    /// Build the route actions.
    ///
    /// Live sources hang off `shutdown`, so cancelling it ends every open
    /// stream and WebSocket.
    pub fn new(
        streaming: &StreamingConfig,
        executor: Executor,
        log: Arc<dyn ActionLog>,
        shutdown: CancellationToken,
    ) -> Result<Self> {
        let tick_interval = streaming.tick_interval()?;
        let cancel_after = streaming.cancel_after()?;
        let websocket_interval = streaming.websocket_interval()?;

        let hello = steps::logged(log)
            .sync(|_ctx| ActionResult::ok().text("Hello World!\n"))
            .with_executor(executor.clone());

        let sse = {
            let shutdown = shutdown.clone();
            Action::sync(move |_ctx| {
                let source = Source::tick_with(
                    CancelHandle::from_token(shutdown.child_token()),
                    Duration::ZERO,
                    tick_interval,
                    || {
                        let payload = serde_json::json!({
                            "time": chrono::Utc::now().timestamp_millis(),
                            "value": "",
                        });
                        sse::event(payload.to_string())
                    },
                );
                let result = ActionResult::ok()
                    .stream(source)
                    .with_content_type(sse::CONTENT_TYPE);
                if let Some(handle) = result.materialized_value() {
                    handle.cancel_after(cancel_after);
                }
                result
            })
            .with_executor(executor.clone())
        };

        let private = steps::request_id()
            .and_then(steps::require_header(API_KEY_HEADER))
            .sync(|ctx| {
                let id = ctx.get_value(&REQUEST_ID)?;
                Ok::<_, ActionError>(ActionResult::ok().json(serde_json::json!({
                    "request_id": id,
                    "authorized": true,
                })))
            })
            .with_executor(executor);

        let websocket = WebSocketHandler::accept(move |ctx| {
            let id = ctx.path_variable("id").unwrap_or_default().to_string();
            let peer = id.clone();
            Flow::new(
                move |message| tracing::info!("WebSocket {} received: {}", peer, message),
                Source::tick_with(
                    CancelHandle::from_token(shutdown.child_token()),
                    Duration::ZERO,
                    websocket_interval,
                    move || format!("msg{id}"),
                ),
            )
        });

        Ok(Self {
            hello,
            sse,
            private,
            websocket,
        })
    }

    /// State for the binary: pool from `[executor]`, logs through `tracing`.
    pub fn from_config(config: &ServerConfig, shutdown: CancellationToken) -> Result<Self> {
        let executor = Executor::from_config(&config.executor)?;
        tracing::info!("Actions scheduled on executor '{}'", executor.name());
        Self::new(
            &config.streaming,
            executor,
            Arc::new(TracingActionLog::new()),
            shutdown,
        )
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/hello", get(hello))
        .route("/api/sse", get(server_sent_events))
        .route("/api/private", get(private))
        .route("/api/websocket/{id}", get(websocket))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new()),
        )
        .with_state(state)
}

async fn hello(State(state): State<AppState>, ctx: RequestContext) -> Response {
    dispatch(&state.hello, ctx).await
}

async fn server_sent_events(State(state): State<AppState>, ctx: RequestContext) -> Response {
    dispatch(&state.sse, ctx).await
}

async fn private(State(state): State<AppState>, ctx: RequestContext) -> Response {
    dispatch(&state.private, ctx).await
}

async fn websocket(
    State(state): State<AppState>,
    ctx: RequestContext,
    ws: WebSocketUpgrade,
) -> Response {
    state.websocket.upgrade(ctx, ws)
}
