//! Glue between axum and the action engine.
//!
//! The router resolves paths and hands the request head to
//! [`RequestContext`]'s extractor; [`dispatch`] binds the context, runs the
//! action and translates the [`ActionResult`] into a transport response.
use std::{collections::HashMap, convert::Infallible};

use axum::{
    body::Body,
    extract::{FromRequestParts, RawPathParams},
    http::{HeaderValue, Request, header, request::Parts},
    response::{IntoResponse, Response},
};
use futures_util::StreamExt;

use crate::core::{Action, ActionResult, RequestContext, ResultBody, stream::sse};

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let path_params: HashMap<String, String> =
            match RawPathParams::from_request_parts(parts, state).await {
                Ok(params) => params
                    .iter()
                    .map(|(name, value)| (name.to_string(), value.to_string()))
                    .collect(),
                Err(e) => {
                    tracing::debug!("No path parameters for {}: {}", parts.uri.path(), e);
                    HashMap::new()
                }
            };

        Ok(RequestContext::new(request_head(parts), path_params))
    }
}

/// Copy of the request head without its extensions.
fn request_head(parts: &Parts) -> Parts {
    let mut request = Request::new(());
    *request.method_mut() = parts.method.clone();
    *request.uri_mut() = parts.uri.clone();
    *request.version_mut() = parts.version;
    *request.headers_mut() = parts.headers.clone();
    let (head, ()) = request.into_parts();
    head
}

impl IntoResponse for ActionResult {
    fn into_response(self) -> Response {
        let (status, headers, content_type, body) = self.into_parts();

        let body = match body {
            ResultBody::Empty => Body::empty(),
            ResultBody::Bytes(bytes) => Body::from(bytes),
            ResultBody::Stream(stream) => Body::from_stream(stream.map(Ok::<_, Infallible>)),
        };

        let mut response = Response::new(body);
        *response.status_mut() = status;
        response.headers_mut().extend(headers);

        if let Some(content_type) = content_type {
            match HeaderValue::from_str(&content_type) {
                Ok(value) => {
                    if content_type.starts_with(sse::CONTENT_TYPE) {
                        response
                            .headers_mut()
                            .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
                    }
                    response.headers_mut().insert(header::CONTENT_TYPE, value);
                }
                Err(e) => tracing::warn!("Invalid content type {}: {}", content_type, e),
            }
        }

        response
    }
}

/// Bind `context` to `action`, run it and build the transport response.
///
/// Headers the chain queued on the context are applied last, so they also
/// reach error results produced by the recovery stage.
pub async fn dispatch(action: &Action, context: RequestContext) -> Response {
    let result = action.with_context(context.clone()).run().await;
    let mut response = result.into_response();
    for (name, value) in context.response_headers().iter() {
        response.headers_mut().insert(name.clone(), value.clone());
    }
    response
}
