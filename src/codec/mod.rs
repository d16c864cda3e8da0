//! # Codecs
//!
//! Codecs are the pluggable capabilities an endpoint is built from:
//!
//! - [`BodyReader`] decodes the request body for one `Content-Type`,
//! - [`Writer`] encodes the response for one `Accept` media type and sets the
//!   response `Content-Type`,
//! - [`ParamsReader`] binds the parameter struct from path, query and context.
//!
//! Each trait is generic over the value it produces or consumes, so a single
//! codec such as [`JsonBodyReader`] serves every `DeserializeOwned` body type.
//! External crates implement these traits to add formats.
//!
//! | Codec | Role | Media type |
//! |-------|------|------------|
//! | [`JsonBodyReader`] | body | `application/json` |
//! | [`FormBodyReader`] | body | `application/x-www-form-urlencoded` |
//! | [`YamlBodyReader`] | body | `application/yaml` |
//! | [`JsonWriter`] | response | `application/json` |
//! | [`YamlWriter`] | response | `application/yaml` |
//! | [`TemplateWriter`] | response | `text/html` |
//! | [`TagParamsReader`] | params | - |
//! | [`FnParamsReader`] | params | - |

mod binder;
mod form;
mod json;
mod template;
mod yaml;

pub use binder::{FnParamsReader, TagParamsReader};
pub use form::FormBodyReader;
pub use json::{JsonBodyReader, JsonWriter};
pub use template::TemplateWriter;
pub use yaml::{YamlBodyReader, YamlWriter};

use crate::error::{BindError, DecodeError, EncodeError};
use crate::params::ParamSource;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Request, Response};

/// Decodes a request body of one content type into `B`.
pub trait BodyReader<B>: Send + Sync + 'static {
    /// Media type this reader is registered under.
    fn content_type(&self) -> &str;

    fn read(&self, req: &Request<Vec<u8>>) -> Result<B, DecodeError>;
}

/// Encodes `R` into the response for one accept type.
///
/// Implementations set the `Content-Type` header and the response body; the
/// dispatcher has already set the status.
pub trait Writer<R>: Send + Sync + 'static {
    /// Media type this writer is registered under.
    fn accept(&self) -> &str;

    fn write(&self, res: &mut Response<Vec<u8>>, value: &R) -> Result<(), EncodeError>;
}

/// Binds a parameter struct `P` for one request.
pub trait ParamsReader<P>: Send + Sync + 'static {
    fn bind(&self, source: &ParamSource<'_>) -> Result<P, BindError>;
}

pub(crate) fn set_body(res: &mut Response<Vec<u8>>, content_type: &'static str, body: Vec<u8>) {
    res.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    *res.body_mut() = body;
}
