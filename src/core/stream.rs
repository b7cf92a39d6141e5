//! Live content producers for streaming results.
//!
//! A [`Source`] is a lazy, non-restartable sequence of chunks, optionally paired
//! with a [`CancelHandle`]. The handle is the "materialized value" of the
//! producer: whoever holds it can stop the stream from outside, independently of
//! the action that created it.
use std::time::Duration;

use bytes::Bytes;
use futures_util::{Stream, StreamExt, stream::BoxStream};
use tokio::{task::JoinHandle, time::Instant};
use tokio_stream::wrappers::IntervalStream;
use tokio_util::sync::CancellationToken;

/// Boxed stream of body chunks.
pub type ChunkStream = BoxStream<'static, Bytes>;

/// Handle that stops a running [`Source`].
///
/// Cancellation is best effort and idempotent: the stream ends cleanly before
/// its next chunk, it never yields an error.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tie the handle to an existing token, e.g. a child of a shutdown token.
    pub fn from_token(token: CancellationToken) -> Self {
        Self { token }
    }

    pub fn cancel(&self) {
        if !self.token.is_cancelled() {
            tracing::debug!("Cancelling stream source");
        }
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the handle has been cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// Schedule a cancel on the current runtime after `delay`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn cancel_after(&self, delay: Duration) -> JoinHandle<()> {
        let handle = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    tracing::info!(
                        "Stream deadline of {} reached",
                        humantime::format_duration(delay)
                    );
                    handle.cancel();
                }
                _ = handle.cancelled() => {}
            }
        })
    }

    fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

/// A producer of chunks for a streaming result.
pub struct Source {
    stream: ChunkStream,
    handle: Option<CancelHandle>,
}

impl Source {
    /// Wrap a stream as-is; the source carries no cancel handle.
    pub fn from_stream<S, T>(stream: S) -> Self
    where
        S: Stream<Item = T> + Send + 'static,
        T: Into<Bytes> + 'static,
    {
        Self {
            stream: stream.map(Into::<Bytes>::into).boxed(),
            handle: None,
        }
    }

    /// Wrap a stream and attach a fresh [`CancelHandle`] to it.
    pub fn cancellable<S, T>(stream: S) -> Self
    where
        S: Stream<Item = T> + Send + 'static,
        T: Into<Bytes> + 'static,
    {
        Self::cancellable_with(stream, CancelHandle::new())
    }

    /// Wrap a stream so that cancelling `handle` ends it.
    pub fn cancellable_with<S, T>(stream: S, handle: CancelHandle) -> Self
    where
        S: Stream<Item = T> + Send + 'static,
        T: Into<Bytes> + 'static,
    {
        let stopped = handle.token().cancelled_owned();
        Self {
            stream: stream.map(Into::<Bytes>::into).take_until(stopped).boxed(),
            handle: Some(handle),
        }
    }

    /// Infinite producer emitting `f()` after `initial_delay` and then every
    /// `interval`, until its handle is cancelled.
    pub fn tick<F, T>(initial_delay: Duration, interval: Duration, f: F) -> Self
    where
        F: FnMut() -> T + Send + 'static,
        T: Into<Bytes> + 'static,
    {
        Self::tick_with(CancelHandle::new(), initial_delay, interval, f)
    }

    /// [`tick`](Self::tick) stopped through an existing `handle`.
    pub fn tick_with<F, T>(
        handle: CancelHandle,
        initial_delay: Duration,
        interval: Duration,
        mut f: F,
    ) -> Self
    where
        F: FnMut() -> T + Send + 'static,
        T: Into<Bytes> + 'static,
    {
        let ticks = IntervalStream::new(tokio::time::interval_at(
            Instant::now() + initial_delay,
            interval,
        ));
        Self::cancellable_with(ticks.map(move |_| f()), handle)
    }

    /// Transform every chunk, keeping the cancel handle.
    pub fn map<F, T>(self, mut f: F) -> Self
    where
        F: FnMut(Bytes) -> T + Send + 'static,
        T: Into<Bytes> + 'static,
    {
        Self {
            stream: self.stream.map(move |chunk| f(chunk).into()).boxed(),
            handle: self.handle,
        }
    }

    pub fn handle(&self) -> Option<&CancelHandle> {
        self.handle.as_ref()
    }

    pub fn into_parts(self) -> (ChunkStream, Option<CancelHandle>) {
        (self.stream, self.handle)
    }

    pub fn into_stream(self) -> ChunkStream {
        self.stream
    }
}

impl std::fmt::Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Source")
            .field("cancellable", &self.handle.is_some())
            .finish_non_exhaustive()
    }
}

/// Server-Sent-Events framing helpers.
pub mod sse {
    pub const CONTENT_TYPE: &str = "text/event-stream";

    /// Frame a single `data:` event.
    pub fn event(data: impl AsRef<str>) -> String {
        format!("data: {}\n\n", data.as_ref())
    }
}
