//! Outcome values produced by terminal handlers.
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};

use crate::core::stream::{CancelHandle, ChunkStream, Source, sse};

pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
pub const APPLICATION_JSON: &str = "application/json";
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Media types whose body must be a live producer rather than a fixed buffer.
const STREAMING_MEDIA_TYPES: &[&str] = &[sse::CONTENT_TYPE];

/// Body of an [`ActionResult`].
pub enum ResultBody {
    Empty,
    Bytes(Bytes),
    Stream(ChunkStream),
}

impl std::fmt::Debug for ResultBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(bytes).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// The outcome of running an action: status, content, content type and an
/// optional materialized side value.
#[derive(Debug)]
pub struct ActionResult {
    status: StatusCode,
    headers: HeaderMap,
    content_type: Option<String>,
    body: ResultBody,
    materialized: Option<CancelHandle>,
}

impl ActionResult {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            content_type: None,
            body: ResultBody::Empty,
            materialized: None,
        }
    }

    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    pub fn bad_request() -> Self {
        Self::new(StatusCode::BAD_REQUEST)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND)
    }

    pub fn internal_server_error() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Plain UTF-8 text body.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.body = ResultBody::Bytes(Bytes::from(text.into()));
        self.content_type = Some(TEXT_PLAIN.to_string());
        self.materialized = None;
        self
    }

    /// JSON body.
    pub fn json(mut self, value: serde_json::Value) -> Self {
        self.body = ResultBody::Bytes(Bytes::from(value.to_string()));
        self.content_type = Some(APPLICATION_JSON.to_string());
        self.materialized = None;
        self
    }

    /// Raw bytes body with an explicit content type.
    pub fn bytes(mut self, bytes: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        self.body = ResultBody::Bytes(bytes.into());
        self.content_type = Some(content_type.into());
        self.materialized = None;
        self
    }

    /// Live body bound to `source`. The source's cancel handle, if any, becomes
    /// the result's materialized value.
    pub fn stream(mut self, source: Source) -> Self {
        let (stream, handle) = source.into_parts();
        self.body = ResultBody::Stream(stream);
        self.content_type = Some(OCTET_STREAM.to_string());
        self.materialized = handle;
        self
    }

    /// Override the content type.
    ///
    /// A streaming media type is only accepted on a streaming body.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        let content_type = content_type.into();
        if is_streaming_media_type(&content_type) && !self.is_streaming() {
            tracing::warn!(
                "Ignoring content type {} on a buffered result body",
                content_type
            );
            return self;
        }
        self.content_type = Some(content_type);
        self
    }

    /// Add a response header. Invalid names or values are skipped with a warning.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match (name.parse::<HeaderName>(), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => tracing::warn!("Invalid result header: {} = {}", name, value),
        }
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self.body, ResultBody::Stream(_))
    }

    /// The body as text, when it is a UTF-8 buffer.
    pub fn body_text(&self) -> Option<&str> {
        match &self.body {
            ResultBody::Bytes(bytes) => std::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }

    /// The cancel handle of the producer behind a streaming body.
    pub fn materialized_value(&self) -> Option<CancelHandle> {
        self.materialized.clone()
    }

    pub fn into_body(self) -> ResultBody {
        self.body
    }

    pub(crate) fn into_parts(self) -> (StatusCode, HeaderMap, Option<String>, ResultBody) {
        (self.status, self.headers, self.content_type, self.body)
    }
}

fn is_streaming_media_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    STREAMING_MEDIA_TYPES.contains(&essence.as_str())
}
