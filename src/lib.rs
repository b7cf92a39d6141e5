//! actionkit - Composable async request actions on top of axum.
//!
//! An HTTP handler is written as a chain of reusable [`ActionStep`]s wrapped
//! around a terminal block. Steps share a per-request, typed
//! [`RequestContext`], may short-circuit the rest of the chain, and observe
//! the outcome once it completes. Whatever fails along the way (an error
//! from a step, a panic in a block, a missing context value) is converted
//! into a well-formed error [`ActionResult`] at a single recovery point.
//!
//! # Features
//! - Associative step composition with before/after semantics
//! - Typed context keys with explicit missing-key and type-mismatch errors
//! - Execution on the ambient runtime or on a dedicated, named worker pool
//! - Streaming results (Server-Sent-Events) with an external cancel handle
//! - WebSocket endpoints pairing an inbound sink with an outbound source
//! - Structured tracing via `tracing`, configuration via the `config` crate
//!
//! # Quick Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use actionkit::{ActionResult, RequestContext, TracingActionLog, dispatch, steps};
//! use axum::{Router, routing::get};
//!
//! # #[tokio::main] async fn main() -> eyre::Result<()> {
//! let hello = steps::logged(Arc::new(TracingActionLog::new()))
//!     .and_then(steps::request_id())
//!     .sync(|_ctx| ActionResult::ok().text("Hello World!\n"));
//!
//! let app: Router = Router::new().route(
//!     "/hello",
//!     get(move |ctx: RequestContext| {
//!         let hello = hello.clone();
//!         async move { dispatch(&hello, ctx).await }
//!     }),
//! );
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(()) }
//! ```
//!
//! # Architecture
//! The crate separates **ports** (traits) from **adapters** (implementations) while keeping
//! the action engine inside `core`. Axum only appears in the adapters: the engine sees the
//! request head and hands back an [`ActionResult`].
//!
//! # Error Handling
//! The engine reports failures as [`ActionError`]; boot code returns `eyre::Result<T>` with
//! context attached using `WrapErr`.
pub mod config;
pub mod ports;
pub mod tracing_setup;
pub mod utils;

pub mod adapters;
pub mod app;
pub mod core;

pub use crate::{
    adapters::{Flow, TracingActionLog, WebSocketHandler, dispatch},
    core::{
        Action, ActionError, ActionFuture, ActionFutureExt, ActionResult, ActionStep,
        CancelHandle, ContextError, ContextKey, Executor, RequestContext, Source, steps,
        stream::sse,
    },
    ports::action_log::ActionLog,
    utils::GracefulShutdown,
};
