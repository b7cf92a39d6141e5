//! Bidirectional text-message endpoints.
//!
//! A [`WebSocketHandler`] maps each accepted connection's context to a
//! [`Flow`]: a sink for inbound text frames and a [`Source`] whose chunks are
//! pushed to the client as text frames. When the client goes away the source's
//! cancel handle is triggered, which stops the producer.
use std::sync::Arc;

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::Response,
};
use futures_util::StreamExt;

use crate::core::{RequestContext, Source};

type Sink = Box<dyn FnMut(String) + Send>;

/// One connection's pairing of inbound consumer and outbound producer.
pub struct Flow {
    sink: Sink,
    source: Source,
}

impl Flow {
    pub fn new<F>(sink: F, source: Source) -> Self
    where
        F: FnMut(String) + Send + 'static,
    {
        Self {
            sink: Box::new(sink),
            source,
        }
    }

    /// Flow that drops every inbound message.
    pub fn outbound(source: Source) -> Self {
        Self::new(|_| {}, source)
    }
}

impl std::fmt::Debug for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flow")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Factory of [`Flow`]s for a WebSocket route.
#[derive(Clone)]
pub struct WebSocketHandler {
    accept: Arc<dyn Fn(&RequestContext) -> Flow + Send + Sync>,
}

impl WebSocketHandler {
    /// Build a flow per accepted connection from its request context.
    pub fn accept<F>(f: F) -> Self
    where
        F: Fn(&RequestContext) -> Flow + Send + Sync + 'static,
    {
        Self {
            accept: Arc::new(f),
        }
    }

    /// Complete the handshake and drive the connection's flow.
    pub fn upgrade(&self, context: RequestContext, ws: WebSocketUpgrade) -> Response {
        let flow = (self.accept)(&context);
        let path = context.path().to_string();
        ws.on_upgrade(move |socket| run_flow(socket, flow, path))
    }
}

impl std::fmt::Debug for WebSocketHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketHandler").finish_non_exhaustive()
    }
}

async fn run_flow(mut socket: WebSocket, flow: Flow, path: String) {
    let Flow { mut sink, source } = flow;
    let (mut outbound, handle) = source.into_parts();

    tracing::info!("WebSocket connection on {} opened", path);

    loop {
        tokio::select! {
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => sink(text.as_str().to_owned()),
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!("WebSocket receive error on {}: {}", path, e);
                    break;
                }
            },
            chunk = outbound.next() => match chunk {
                Some(chunk) => {
                    let text = String::from_utf8_lossy(&chunk).into_owned();
                    if let Err(e) = socket.send(Message::Text(text.into())).await {
                        tracing::debug!("WebSocket send on {} failed: {}", path, e);
                        break;
                    }
                }
                None => {
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                }
            },
        }
    }

    if let Some(handle) = handle {
        handle.cancel();
    }
    tracing::info!("WebSocket connection on {} closed", path);
}
