//! Request identifiers
//!
//! Each dispatched request carries a [`RequestId`]. An inbound
//! `x-request-id` header is honoured when it holds a ULID; anything else is
//! replaced with a fresh one. The id is written back on every response,
//! errors included, so clients can quote it.

use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;
use std::fmt;
use std::str::FromStr;

/// Header carrying the request identifier in and out of an endpoint.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// ULID-backed request identifier.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct RequestId(ulid::Ulid);

impl RequestId {
    #[must_use]
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// The id named by the request's `x-request-id` header, or a new one when
    /// the header is missing or not a ULID.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or_default()
    }

    /// Set `x-request-id` on outbound headers, replacing any previous value.
    pub fn stamp(&self, headers: &mut HeaderMap) {
        if let Ok(value) = HeaderValue::from_str(&self.0.to_string()) {
            headers.insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
        }
    }

    /// Milliseconds since the Unix epoch at which the id was minted.
    #[must_use]
    pub fn timestamp_ms(&self) -> u64 {
        self.0.timestamp_ms()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for RequestId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ulid::Ulid::from_string(s).map(RequestId)
    }
}
