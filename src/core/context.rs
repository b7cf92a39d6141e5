//! Per-request state threaded through an action chain.
//!
//! A [`RequestContext`] is created once per inbound request by the routing
//! collaborator. Steps read the request head, stash typed values for later
//! steps and queue response headers. Cloning the handle never copies the state:
//! every clone observes the same values.
use std::{
    any::{Any, type_name},
    collections::HashMap,
    marker::PhantomData,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use http::{HeaderMap, HeaderName, HeaderValue, Request, request::Parts};

use crate::core::error::ContextError;

/// Typed token naming a slot in a [`RequestContext`].
///
/// Two keys with the same name address the same slot; reading it through a key
/// of a different type fails with [`ContextError::TypeMismatch`].
pub struct ContextKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ContextKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for ContextKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ContextKey<T> {}

impl<T> std::fmt::Debug for ContextKey<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ContextKey<{}>({:?})", type_name::<T>(), self.name)
    }
}

struct StoredValue {
    value: Box<dyn Any + Send + Sync>,
    type_name: &'static str,
}

struct ContextInner {
    request: Parts,
    path_params: HashMap<String, String>,
    response_headers: RwLock<HeaderMap>,
    values: RwLock<HashMap<&'static str, StoredValue>>,
}

/// Typed, internally mutable store scoped to one in-flight request.
#[derive(Clone)]
pub struct RequestContext {
    inner: Arc<ContextInner>,
}

impl RequestContext {
    /// Build a context from the head of an inbound request and the path
    /// variables the router already resolved.
    pub fn new(request: Parts, path_params: HashMap<String, String>) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                request,
                path_params,
                response_headers: RwLock::new(HeaderMap::new()),
                values: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Context for a bare `GET /` request, used when an action has not been
    /// bound to a real request yet.
    pub fn empty() -> Self {
        let (parts, ()) = Request::new(()).into_parts();
        Self::new(parts, HashMap::new())
    }

    pub fn request(&self) -> &Parts {
        &self.inner.request
    }

    pub fn path(&self) -> &str {
        self.inner.request.uri.path()
    }

    /// A path variable resolved by the router, e.g. `id` in `/websocket/{id}`.
    pub fn path_variable(&self, name: &str) -> Option<&str> {
        self.inner.path_params.get(name).map(String::as_str)
    }

    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.inner.request.headers.get(name)
    }

    /// Insert or overwrite the value stored under `key`.
    pub fn set_value<T>(&self, key: &ContextKey<T>, value: T) -> &Self
    where
        T: Send + Sync + 'static,
    {
        self.values_mut().insert(
            key.name,
            StoredValue {
                value: Box::new(value),
                type_name: type_name::<T>(),
            },
        );
        self
    }

    /// Chaining form of [`set_value`](Self::set_value) that hands the context
    /// back, ready to pass to `next`.
    pub fn with_value<T>(self, key: ContextKey<T>, value: T) -> Self
    where
        T: Send + Sync + 'static,
    {
        self.set_value(&key, value);
        self
    }

    /// Read the value stored under `key`.
    pub fn get_value<T>(&self, key: &ContextKey<T>) -> Result<T, ContextError>
    where
        T: Clone + 'static,
    {
        let values = self.values();
        let stored = values
            .get(key.name)
            .ok_or(ContextError::MissingKey { key: key.name })?;
        stored
            .value
            .downcast_ref::<T>()
            .cloned()
            .ok_or(ContextError::TypeMismatch {
                key: key.name,
                expected: type_name::<T>(),
                found: stored.type_name,
            })
    }

    pub fn contains<T>(&self, key: &ContextKey<T>) -> bool {
        self.values().contains_key(key.name)
    }

    /// Remove the slot named by `key`, returning whether it existed.
    pub fn remove<T>(&self, key: &ContextKey<T>) -> bool {
        self.values_mut().remove(key.name).is_some()
    }

    /// Queue a header for the response. Applied by the collaborator to whatever
    /// result the chain produces, error results included.
    pub fn insert_response_header(&self, name: HeaderName, value: HeaderValue) {
        self.response_headers_mut().insert(name, value);
    }

    pub fn response_headers(&self) -> HeaderMap {
        match self.inner.response_headers.read() {
            Ok(headers) => headers.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn response_headers_mut(&self) -> RwLockWriteGuard<'_, HeaderMap> {
        self.inner
            .response_headers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn values(&self) -> RwLockReadGuard<'_, HashMap<&'static str, StoredValue>> {
        self.inner
            .values
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn values_mut(&self) -> RwLockWriteGuard<'_, HashMap<&'static str, StoredValue>> {
        self.inner
            .values
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<&'static str> = self.values().keys().copied().collect();
        f.debug_struct("RequestContext")
            .field("method", &self.inner.request.method)
            .field("uri", &self.inner.request.uri)
            .field("path_params", &self.inner.path_params)
            .field("keys", &keys)
            .finish()
    }
}
