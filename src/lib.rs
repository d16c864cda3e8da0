//! # handlr
//!
//! **handlr** turns a plain business function
//! `fn(&RequestContext, Body, Params) -> anyhow::Result<Response>` into an HTTP
//! request handler. Decoding, parameter binding, content negotiation and
//! encoding are pluggable codecs chosen per endpoint.
//!
//! ## Architecture
//!
//! - **[`payload`]** - the [`Payload`] trait and the [`Void`] marker for empty positions
//! - **[`codec`]** - body readers, writers and parameter binders (JSON, YAML, form, HTML templates)
//! - **[`registry`]** - per-endpoint lookup tables, filled from [`Capability`] values
//! - **[`params`]** - path/query/context sources and the `#[derive(Params)]` binding contract
//! - **[`endpoint`]** - builder that validates an endpoint's capabilities once at registration
//! - **[`dispatch`]** - the per-request pipeline
//! - **[`negotiate`]** - `Content-Type` and `Accept` handling
//! - **[`context`]** - request-scoped values, deadline and cancellation
//! - **[`error`]** - configuration, codec and request errors with their HTTP statuses
//! - **[`config`]** / **[`otel`]** - environment-driven settings and logging setup
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Router
//!     participant Dispatcher
//!     participant Reader as BodyReader
//!     participant Binder as ParamsReader
//!     participant Handler as Business fn
//!     participant Writer
//!
//!     Router->>Dispatcher: Request + PathParams
//!     alt Body is not Void
//!         Dispatcher->>Reader: lookup by Content-Type
//!         alt No reader
//!             Dispatcher-->>Router: 415 Unsupported Media Type
//!         end
//!         Reader-->>Dispatcher: Body (or 400)
//!     end
//!     alt Params is not Void
//!         Dispatcher->>Binder: path, query, context
//!         Binder-->>Dispatcher: Params (or 400)
//!     end
//!     Dispatcher->>Handler: (ctx, body, params)
//!     alt Error
//!         Handler-->>Dispatcher: StatusError status, else 500
//!     end
//!     alt Response is Void
//!         Dispatcher-->>Router: 204 No Content
//!     else
//!         Dispatcher->>Writer: lookup by Accept
//!         alt No writer
//!             Dispatcher-->>Router: 406 Not Acceptable
//!         end
//!         Writer-->>Router: 200 OK + encoded body
//!     end
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use handlr::{Endpoint, JsonWriter, PathParams, RequestContext, Void};
//! use http::Request;
//! use serde::Serialize;
//!
//! #[derive(handlr::Params, Default)]
//! struct GetPet {
//!     #[param(path = "id")]
//!     id: i64,
//! }
//!
//! #[derive(Serialize, handlr::Payload)]
//! struct Pet {
//!     id: i64,
//! }
//!
//! let handler = Endpoint::<Void, GetPet, Pet>::builder()
//!     .with_defaults()
//!     .with(JsonWriter)
//!     .build()
//!     .expect("valid endpoint")
//!     .into_handler(|_ctx: &RequestContext, _body: Void, p: GetPet| Ok(Pet { id: p.id }));
//!
//! let mut req = Request::get("/pets/42").body(Vec::new()).unwrap();
//! req.extensions_mut().insert(PathParams::from_iter([("id", "42")]));
//! let res = handler(req);
//! assert_eq!(res.status(), 200);
//! assert_eq!(res.body().as_slice(), br#"{"id":42}"#);
//! ```
//!
//! ## Runtime Considerations
//!
//! Dispatch is synchronous and runs on the caller's thread. A handler is
//! immutable once built and is shared across threads behind an `Arc`; the
//! pipeline holds no locks. Long-running business functions should watch
//! [`RequestContext::is_done`] for deadlines and cancellation.

extern crate self as handlr;

pub mod codec;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod ids;
pub mod negotiate;
pub mod otel;
pub mod params;
pub mod payload;
pub mod registry;

pub use codec::{
    BodyReader, FnParamsReader, FormBodyReader, JsonBodyReader, JsonWriter, ParamsReader,
    TagParamsReader, TemplateWriter, Writer, YamlBodyReader, YamlWriter,
};
pub use config::DispatchConfig;
pub use context::{Canceller, RequestContext};
pub use dispatch::{Dispatcher, Handler};
pub use endpoint::{handle, Endpoint, EndpointBuilder, RequestHandler};
pub use error::{
    BindError, ConfigError, DecodeError, EncodeError, ParamError, ParamOrigin, RequestError,
    StatusError,
};
pub use handlr_macros::{Params, Payload};
pub use ids::{RequestId, REQUEST_ID_HEADER};
pub use params::{BindParams, BindPolicy, FromParam, ParamSource, PathParams};
pub use payload::{Payload, Void};
pub use registry::{defaults, Capability, CodecRegistry};
