//! # Request Dispatch
//!
//! The [`Dispatcher`] runs one request through the endpoint pipeline, inline
//! on the calling thread:
//!
//! ```text
//! body stage ──► params stage ──► business function ──► response stage
//!  415/413/400       400            status or 500          406 / 204 / 200
//! ```
//!
//! 1. **Body** (skipped when the body is void): pick the reader for the
//!    request `Content-Type` (default `application/json`), enforce the body
//!    size limit, decode.
//! 2. **Params** (skipped when the params are void): run the binder over the
//!    path captures, query string and request context.
//! 3. **Invoke** the business function with the [`RequestContext`], body and
//!    params. A panic is caught and reported as `500`.
//! 4. **Respond**: a void response becomes `204 No Content`; otherwise the
//!    writer chosen from `Accept` encodes the value with `200 OK`.
//!
//! Every failure is terminal for the request and is answered exactly once
//! with a plain-text error body. Nothing here is retried, and nothing is
//! shared between requests except the read-only endpoint.

use crate::context::RequestContext;
use crate::endpoint::Endpoint;
use crate::error::RequestError;
use crate::negotiate;
use crate::params::ParamSource;
use crate::payload::Payload;
use http::{Request, Response, StatusCode};
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};
use tracing::{debug, error, field, info_span, warn};

/// A business function: `(context, body, params) -> response`.
///
/// Implemented for every `Fn(&RequestContext, B, P) -> anyhow::Result<R>`.
pub trait Handler<B, P, R>: Send + Sync + 'static {
    fn call(&self, ctx: &RequestContext, body: B, params: P) -> anyhow::Result<R>;
}

impl<B, P, R, F> Handler<B, P, R> for F
where
    F: Fn(&RequestContext, B, P) -> anyhow::Result<R> + Send + Sync + 'static,
{
    fn call(&self, ctx: &RequestContext, body: B, params: P) -> anyhow::Result<R> {
        (self)(ctx, body, params)
    }
}

/// An endpoint bound to its business function.
pub struct Dispatcher<B, P, R, H> {
    endpoint: Endpoint<B, P, R>,
    handler: H,
}

impl<B, P, R, H> Dispatcher<B, P, R, H>
where
    B: Payload,
    P: Payload,
    R: Payload,
    H: Handler<B, P, R>,
{
    #[must_use]
    pub fn new(endpoint: Endpoint<B, P, R>, handler: H) -> Self {
        Self { endpoint, handler }
    }

    #[must_use]
    pub fn endpoint(&self) -> &Endpoint<B, P, R> {
        &self.endpoint
    }

    /// Run one request to completion and produce its response.
    ///
    /// The [`RequestContext`] is taken from the request extensions when the
    /// router glue attached one; otherwise a fresh context is created.
    pub fn dispatch(&self, mut req: Request<Vec<u8>>) -> Response<Vec<u8>> {
        let ctx = req
            .extensions_mut()
            .remove::<RequestContext>()
            .unwrap_or_else(|| RequestContext::from_headers(req.headers()));
        let request_id = ctx.request_id();

        let span = info_span!(
            "dispatch",
            method = %req.method(),
            path = %req.uri().path(),
            request_id = %request_id,
            status = field::Empty
        );
        let _entered = span.enter();
        let start = Instant::now();

        let mut res = match self.run(&req, &ctx) {
            Ok(res) => res,
            Err(err) => {
                let status = err.status();
                if status.is_server_error() {
                    error!(status = status.as_u16(), error = %err, "Request failed");
                } else {
                    warn!(status = status.as_u16(), error = %err, "Request rejected");
                }
                err.into_response()
            }
        };

        request_id.stamp(res.headers_mut());
        span.record("status", res.status().as_u16());
        debug!(
            status = res.status().as_u16(),
            latency_us = micros(start.elapsed()),
            "Request dispatched"
        );
        res
    }

    fn run(
        &self,
        req: &Request<Vec<u8>>,
        ctx: &RequestContext,
    ) -> Result<Response<Vec<u8>>, RequestError> {
        let body = self.read_body(req)?;
        let params = self.bind_params(req, ctx)?;
        let value = self.invoke(ctx, body, params)?;
        self.write_response(req, value)
    }

    fn read_body(&self, req: &Request<Vec<u8>>) -> Result<B, RequestError> {
        if let Some(void) = B::void() {
            return Ok(void);
        }
        let content_type = negotiate::request_content_type(req.headers());
        let reader = self
            .endpoint
            .registry()
            .body_reader(&content_type)
            .ok_or(RequestError::UnsupportedMediaType(content_type))?;

        let limit = self.endpoint.config().max_body_bytes;
        let size = req.body().len();
        if limit > 0 && size > limit {
            return Err(RequestError::PayloadTooLarge { size, limit });
        }
        Ok(reader.read(req)?)
    }

    fn bind_params(
        &self,
        req: &Request<Vec<u8>>,
        ctx: &RequestContext,
    ) -> Result<P, RequestError> {
        if let Some(void) = P::void() {
            return Ok(void);
        }
        let reader = self
            .endpoint
            .registry()
            .params_reader()
            .ok_or(RequestError::Internal("params reader missing"))?;
        let source = ParamSource::from_request(req, ctx, self.endpoint.config().bind_policy);
        Ok(reader.bind(&source)?)
    }

    fn invoke(&self, ctx: &RequestContext, body: B, params: P) -> Result<R, RequestError> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.handler.call(ctx, body, params))) {
            Ok(result) => result.map_err(RequestError::Handler),
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(panic = %message, "Handler panicked");
                Err(RequestError::Handler(anyhow::anyhow!("handler panicked")))
            }
        }
    }

    fn write_response(
        &self,
        req: &Request<Vec<u8>>,
        value: R,
    ) -> Result<Response<Vec<u8>>, RequestError> {
        let mut res = Response::new(Vec::new());
        if R::is_void() {
            *res.status_mut() = StatusCode::NO_CONTENT;
            return Ok(res);
        }

        let registry = self.endpoint.registry();
        let writer = negotiate::accept_candidates(req.headers())
            .iter()
            .find_map(|accept| registry.writer(accept))
            .ok_or_else(|| {
                let header = negotiate::accept_header(req.headers());
                RequestError::NotAcceptable(if header.trim().is_empty() {
                    negotiate::DEFAULT_MEDIA_TYPE.to_string()
                } else {
                    header
                })
            })?;
        writer.write(&mut res, &value)?;
        Ok(res)
    }
}

fn micros(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{JsonBodyReader, JsonWriter};
    use crate::ids::REQUEST_ID_HEADER;
    use crate::payload::Void;
    use serde_json::{json, Value};

    fn echo() -> Dispatcher<
        Value,
        Void,
        Value,
        impl Handler<Value, Void, Value>,
    > {
        Endpoint::<Value, Void, Value>::builder()
            .with(JsonBodyReader)
            .with(JsonWriter)
            .build()
            .expect("valid endpoint")
            .dispatcher(|_ctx: &RequestContext, body: Value, _p: Void| -> anyhow::Result<Value> {
                Ok(body)
            })
    }

    fn post(content_type: &str, body: &str) -> Request<Vec<u8>> {
        Request::post("/echo")
            .header(http::header::CONTENT_TYPE, content_type)
            .body(body.as_bytes().to_vec())
            .expect("request")
    }

    #[test]
    fn test_echo_json() {
        let res = echo().dispatch(post("application/json", r#"{"a":[1,2]}"#));
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(res.body()).expect("json");
        assert_eq!(body, json!({"a": [1, 2]}));
        assert!(res.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tracing_test::traced_test]
    #[test]
    fn test_rejection_is_logged_as_warning() {
        let res = echo().dispatch(post("text/xml", "<a/>"));
        assert_eq!(res.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(logs_contain("Request rejected"));
        assert!(logs_contain("unsupported content type text/xml"));
    }

    #[tracing_test::traced_test]
    #[test]
    fn test_panic_is_logged_as_error() {
        let dispatcher = Endpoint::<Void, Void, Value>::builder()
            .with(JsonWriter)
            .build()
            .expect("valid endpoint")
            .dispatcher(|_ctx: &RequestContext, _b: Void, _p: Void| -> anyhow::Result<Value> {
                panic!("boom")
            });
        let res = dispatcher.dispatch(Request::new(Vec::new()));
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(logs_contain("Handler panicked"));
        assert!(logs_contain("boom"));
    }

    #[test]
    fn test_latency_saturates() {
        assert_eq!(micros(Duration::from_millis(3)), 3_000);
        assert_eq!(micros(Duration::MAX), u64::MAX);
    }
}
