//! # Request Context
//!
//! [`RequestContext`] is the request-scoped state handed to every business
//! function: the request id, named values placed there by upstream middleware
//! (an authenticated user, a tenant, a database handle), an optional deadline
//! and a cancellation flag.
//!
//! Router glue attaches a context to the inbound request through
//! `http::Request::extensions_mut`; when none is attached the dispatcher
//! creates one, reusing an inbound `x-request-id` header if it parses.
//!
//! Values are stored by name and retrieved by type. A lookup whose type does
//! not match the stored value returns `None`, which is what makes `ctx`
//! parameter binding lenient.

use crate::ids::RequestId;
use http::HeaderMap;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

type Value = Arc<dyn Any + Send + Sync>;

/// Request-scoped values, deadline and cancellation.
#[derive(Clone)]
pub struct RequestContext {
    request_id: RequestId,
    values: HashMap<String, Value>,
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

/// Handle that cancels the context it was taken from, from any thread.
#[derive(Clone, Debug)]
pub struct Canceller(Arc<AtomicBool>);

impl Canceller {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestContext {
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            values: HashMap::new(),
            deadline: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Build a context for a request that arrived without one.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self::with_request_id(RequestId::from_headers(headers))
    }

    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Store a named value. A later insert under the same name replaces it.
    pub fn insert<T: Any + Send + Sync>(&mut self, name: impl Into<String>, value: T) {
        self.values.insert(name.into(), Arc::new(value));
    }

    #[must_use]
    pub fn with_value<T: Any + Send + Sync>(mut self, name: impl Into<String>, value: T) -> Self {
        self.insert(name, value);
        self
    }

    /// Fetch a named value if one is stored with exactly type `T`.
    #[must_use]
    pub fn get<T: Any>(&self, name: &str) -> Option<&T> {
        self.values.get(name).and_then(|v| v.downcast_ref::<T>())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; `None` when no deadline is set.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// True once cancelled or past the deadline.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn canceller(&self) -> Canceller {
        Canceller(Arc::clone(&self.cancelled))
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("values", &self.values.keys().collect::<Vec<_>>())
            .field("deadline", &self.deadline)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::REQUEST_ID_HEADER;

    #[test]
    fn test_typed_lookup_requires_matching_type() {
        let ctx = RequestContext::new()
            .with_value("user", "ada".to_string())
            .with_value("age", 36i64);
        assert_eq!(ctx.get::<String>("user").map(String::as_str), Some("ada"));
        assert_eq!(ctx.get::<i64>("age"), Some(&36));
        assert!(ctx.get::<i32>("age").is_none());
        assert!(ctx.get::<String>("missing").is_none());
        assert!(ctx.contains("age"));
    }

    #[test]
    fn test_cancellation_is_shared_with_clones() {
        let ctx = RequestContext::new();
        let clone = ctx.clone();
        let canceller = ctx.canceller();
        assert!(!clone.is_cancelled());
        canceller.cancel();
        assert!(ctx.is_cancelled());
        assert!(clone.is_done());
    }

    #[test]
    fn test_deadline_in_the_past_is_done() {
        let ctx = RequestContext::new().with_timeout(Duration::ZERO);
        assert!(ctx.is_done());
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn test_request_id_taken_from_headers() {
        let id = RequestId::new();
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, id.to_string().parse().unwrap());
        assert_eq!(RequestContext::from_headers(&headers).request_id(), id);
    }
}
