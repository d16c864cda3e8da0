//! # Errors
//!
//! Two families of errors exist and they never mix:
//!
//! - [`ConfigError`] is returned while an endpoint is being registered. It
//!   describes a programming mistake (a declared body with no reader, a
//!   response with no writer) and is meant to stop the process at startup.
//! - [`RequestError`] is produced per request by the dispatcher and is always
//!   turned into exactly one HTTP error response via
//!   [`RequestError::into_response`].
//!
//! Business functions return `anyhow::Result`. To choose the status code of a
//! failure, return a [`StatusError`] (anywhere in the error chain); anything
//! else maps to `500 Internal Server Error`.

use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Response, StatusCode};
use std::fmt;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Endpoint registration failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no body reader provided, please provide one")]
    MissingBodyReader,
    #[error("no params reader provided, please provide one")]
    MissingParamsReader,
    #[error("no writers provided, please provide one")]
    MissingWriters,
    /// A capability declared a key that is not a `type/subtype` media type.
    #[error("unknown capability {type_name}: {key:?} is not a media type")]
    InvalidCapability {
        type_name: &'static str,
        key: String,
    },
}

/// Body decoding failure reported by a [`crate::BodyReader`].
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("error decoding request body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("error decoding request body: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("error decoding request body: {0}")]
    Form(#[from] serde::de::value::Error),
    #[error("error decoding request body: {0}")]
    Other(String),
}

impl DecodeError {
    pub fn other(message: impl fmt::Display) -> Self {
        DecodeError::Other(message.to_string())
    }
}

/// Response encoding failure reported by a [`crate::Writer`].
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("error encoding response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("error encoding response: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("error rendering template: {0}")]
    Template(#[from] minijinja::Error),
    #[error("error encoding response: {0}")]
    Other(String),
}

impl EncodeError {
    pub fn other(message: impl fmt::Display) -> Self {
        EncodeError::Other(message.to_string())
    }
}

/// Source of a bound parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamOrigin {
    Path,
    Query,
    Context,
}

impl fmt::Display for ParamOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ParamOrigin::Path => "path",
            ParamOrigin::Query => "query",
            ParamOrigin::Context => "context",
        })
    }
}

/// A raw parameter string that could not be coerced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected}, got {raw:?}")]
pub struct ParamError {
    pub expected: &'static str,
    pub raw: String,
}

/// Parameter binding failure reported by a [`crate::ParamsReader`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("missing required {origin} parameter `{name}`")]
    Missing { origin: ParamOrigin, name: String },
    #[error("invalid {origin} parameter `{name}`: {source}")]
    Invalid {
        origin: ParamOrigin,
        name: String,
        source: ParamError,
    },
    #[error("{0}")]
    Other(String),
}

/// A business error that names its own HTTP status.
#[derive(Debug, Error)]
#[error("{inner}")]
pub struct StatusError {
    status: StatusCode,
    inner: BoxError,
}

impl StatusError {
    pub fn new(status: StatusCode, err: impl Into<BoxError>) -> Self {
        Self {
            status,
            inner: err.into(),
        }
    }

    pub fn internal(err: impl Into<BoxError>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    pub fn bad_gateway(err: impl Into<BoxError>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, err)
    }

    pub fn unavailable(err: impl Into<BoxError>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, err)
    }

    pub fn timeout(err: impl Into<BoxError>) -> Self {
        Self::new(StatusCode::GATEWAY_TIMEOUT, err)
    }

    pub fn bad_request(err: impl Into<BoxError>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, err)
    }

    pub fn not_found(err: impl Into<BoxError>) -> Self {
        Self::new(StatusCode::NOT_FOUND, err)
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn into_inner(self) -> BoxError {
        self.inner
    }
}

/// Terminal failure of one dispatched request.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("unsupported content type {0}")]
    UnsupportedMediaType(String),
    #[error("request body of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Bind(#[from] BindError),
    #[error("unsupported accept type {0}")]
    NotAcceptable(String),
    #[error("{0}")]
    Handler(anyhow::Error),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("{0}")]
    Internal(&'static str),
}

impl RequestError {
    /// HTTP status reported to the client for this failure.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            RequestError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            RequestError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            RequestError::Decode(_) | RequestError::Bind(_) => StatusCode::BAD_REQUEST,
            RequestError::NotAcceptable(_) => StatusCode::NOT_ACCEPTABLE,
            RequestError::Handler(err) => handler_status(err),
            RequestError::Encode(_) | RequestError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Render the failure as a plain-text error response.
    #[must_use]
    pub fn into_response(self) -> Response<Vec<u8>> {
        let mut res = Response::new(format!("{self}\n").into_bytes());
        *res.status_mut() = self.status();
        res.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        res
    }
}

/// Status declared by the first [`StatusError`] in the chain, else 500.
#[must_use]
pub fn handler_status(err: &anyhow::Error) -> StatusCode {
    err.chain()
        .find_map(|e| e.downcast_ref::<StatusError>())
        .map_or(StatusCode::INTERNAL_SERVER_ERROR, StatusError::status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_status_error_helpers() {
        let cases = [
            (StatusError::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR),
            (StatusError::bad_gateway("upstream"), StatusCode::BAD_GATEWAY),
            (StatusError::unavailable("down"), StatusCode::SERVICE_UNAVAILABLE),
            (StatusError::timeout("slow"), StatusCode::GATEWAY_TIMEOUT),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status);
        }
        assert_eq!(StatusError::not_found("no pet").to_string(), "no pet");
    }

    #[test]
    fn test_handler_status_searches_chain() {
        let err = anyhow::Error::new(StatusError::not_found("no pet"));
        assert_eq!(handler_status(&err), StatusCode::NOT_FOUND);

        let wrapped: anyhow::Result<()> =
            Err(StatusError::timeout("slow")).context("fetching inventory");
        let wrapped = wrapped.unwrap_err();
        assert_eq!(handler_status(&wrapped), StatusCode::GATEWAY_TIMEOUT);

        assert_eq!(
            handler_status(&anyhow::anyhow!("plain")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_request_error_status_mapping() {
        assert_eq!(
            RequestError::UnsupportedMediaType("text/xml".into()).status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            RequestError::NotAcceptable("text/csv".into()).status(),
            StatusCode::NOT_ACCEPTABLE
        );
        assert_eq!(
            RequestError::Bind(BindError::Other("nope".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RequestError::PayloadTooLarge { size: 2, limit: 1 }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn test_into_response_is_plain_text() {
        let res = RequestError::UnsupportedMediaType("text/xml".into()).into_response();
        assert_eq!(res.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(
            res.headers()[CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert_eq!(res.body(), b"unsupported content type text/xml\n");
    }
}
