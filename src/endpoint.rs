//! # Endpoint Builder
//!
//! An [`Endpoint`] is the validated, immutable configuration of one route:
//! its codec registry and its [`DispatchConfig`]. It is produced by
//! [`EndpointBuilder::build`], which checks once, at registration time, that
//! every declared (non-void) position has a codec to serve it:
//!
//! | Declared | Required capability | Error |
//! |----------|--------------------|-------|
//! | Body is not void | at least one body reader | [`ConfigError::MissingBodyReader`] |
//! | Params is not void | a params reader | [`ConfigError::MissingParamsReader`] |
//! | Response is not void | at least one writer | [`ConfigError::MissingWriters`] |
//!
//! A misconfigured endpoint therefore fails at startup instead of answering
//! live requests with errors.
//!
//! ## Registration
//!
//! Routing is not done here. The caller passes a `mount` function that binds a
//! path to the produced [`RequestHandler`] on whatever router it uses:
//!
//! ```rust
//! use handlr::{handle, JsonBodyReader, JsonWriter, RequestContext, RequestHandler, Void};
//! use serde::{Deserialize, Serialize};
//! use std::collections::HashMap;
//!
//! #[derive(Deserialize, handlr::Payload)]
//! struct Greet {
//!     #[serde(rename = "Name")]
//!     name: String,
//! }
//!
//! #[derive(Serialize, handlr::Payload)]
//! struct Greeting {
//!     #[serde(rename = "Greeting")]
//!     greeting: String,
//! }
//!
//! fn greet(_ctx: &RequestContext, body: Greet, _params: Void) -> anyhow::Result<Greeting> {
//!     Ok(Greeting { greeting: format!("Hello, {}", body.name) })
//! }
//!
//! let mut routes: HashMap<String, RequestHandler> = HashMap::new();
//! handle(
//!     |path: &str, h: RequestHandler| {
//!         routes.insert(path.to_string(), h);
//!     },
//!     "/greet",
//!     greet,
//!     vec![JsonBodyReader.into(), JsonWriter.into()],
//! )
//! .expect("endpoint is fully configured");
//! assert!(routes.contains_key("/greet"));
//! ```

use crate::codec::{BodyReader, ParamsReader, Writer};
use crate::config::DispatchConfig;
use crate::dispatch::{Dispatcher, Handler};
use crate::error::ConfigError;
use crate::params::{BindParams, BindPolicy};
use crate::payload::Payload;
use crate::registry::{defaults, Capability, CodecRegistry};
use http::{Request, Response};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info};

/// A route-ready request handler, shared across all concurrent requests.
pub type RequestHandler = Arc<dyn Fn(Request<Vec<u8>>) -> Response<Vec<u8>> + Send + Sync>;

/// Collects capabilities and settings for one endpoint.
pub struct EndpointBuilder<B, P, R> {
    registry: CodecRegistry<B, P, R>,
    config: DispatchConfig,
    error: Option<ConfigError>,
}

impl<B: Payload, P: Payload, R: Payload> Default for EndpointBuilder<B, P, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Payload, P: Payload, R: Payload> EndpointBuilder<B, P, R> {
    /// An empty builder whose settings start from [`DispatchConfig::from_env`].
    /// The setters below override them.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: CodecRegistry::new(),
            config: DispatchConfig::from_env(),
            error: None,
        }
    }

    /// Register one capability (or a bundle). The first registration error is
    /// kept and reported by [`build`](Self::build).
    #[must_use]
    pub fn with(mut self, capability: impl Into<Capability<B, P, R>>) -> Self {
        if self.error.is_none() {
            if let Err(err) = self.registry.register(capability.into()) {
                self.error = Some(err);
            }
        }
        self
    }

    #[must_use]
    pub fn with_all<I>(self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = Capability<B, P, R>>,
    {
        self.with(Capability::Bundle(capabilities.into_iter().collect()))
    }

    #[must_use]
    pub fn reader<T: BodyReader<B>>(self, reader: T) -> Self {
        self.with(Capability::body_reader(reader))
    }

    #[must_use]
    pub fn writer<T: Writer<R>>(self, writer: T) -> Self {
        self.with(Capability::writer(writer))
    }

    #[must_use]
    pub fn params<T: ParamsReader<P>>(self, reader: T) -> Self {
        self.with(Capability::params_reader(reader))
    }

    #[must_use]
    pub fn config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.config.max_body_bytes = limit;
        self
    }

    #[must_use]
    pub fn bind_policy(mut self, policy: BindPolicy) -> Self {
        self.config.bind_policy = policy;
        self
    }

    /// Validate the collected capabilities and freeze them.
    ///
    /// # Errors
    ///
    /// The first registration error, else the first missing capability in the
    /// order body reader, params reader, writers.
    pub fn build(self) -> Result<Endpoint<B, P, R>, ConfigError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        validate(&self.registry)?;
        Ok(Endpoint {
            registry: Arc::new(self.registry),
            config: self.config,
        })
    }
}

impl<B, P, R> EndpointBuilder<B, P, R>
where
    B: Payload + DeserializeOwned,
    P: Payload + BindParams,
    R: Payload,
{
    /// Install [`defaults`]: a JSON body reader and the tag binder. Later
    /// registrations override them.
    #[must_use]
    pub fn with_defaults(self) -> Self {
        self.with(Capability::Bundle(defaults()))
    }
}

fn validate<B: Payload, P: Payload, R: Payload>(
    registry: &CodecRegistry<B, P, R>,
) -> Result<(), ConfigError> {
    if !B::is_void() && !registry.has_body_readers() {
        return Err(ConfigError::MissingBodyReader);
    }
    if !P::is_void() && !registry.has_params_reader() {
        return Err(ConfigError::MissingParamsReader);
    }
    if !R::is_void() && !registry.has_writers() {
        return Err(ConfigError::MissingWriters);
    }
    Ok(())
}

/// A validated endpoint configuration.
pub struct Endpoint<B, P, R> {
    registry: Arc<CodecRegistry<B, P, R>>,
    config: DispatchConfig,
}

impl<B, P, R> Clone for Endpoint<B, P, R> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            config: self.config,
        }
    }
}

impl<B: 'static, P, R: 'static> fmt::Debug for Endpoint<B, P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish()
    }
}

impl<B: Payload, P: Payload, R: Payload> Endpoint<B, P, R> {
    #[must_use]
    pub fn builder() -> EndpointBuilder<B, P, R> {
        EndpointBuilder::new()
    }

    #[must_use]
    pub fn registry(&self) -> &CodecRegistry<B, P, R> {
        &self.registry
    }

    #[must_use]
    pub fn config(&self) -> DispatchConfig {
        self.config
    }

    /// Pair this endpoint with its business function.
    #[must_use]
    pub fn dispatcher<H: Handler<B, P, R>>(self, handler: H) -> Dispatcher<B, P, R, H> {
        Dispatcher::new(self, handler)
    }

    /// The request handler to mount on a router.
    #[must_use]
    pub fn into_handler<H: Handler<B, P, R>>(self, handler: H) -> RequestHandler {
        let dispatcher = Arc::new(self.dispatcher(handler));
        Arc::new(move |req: Request<Vec<u8>>| dispatcher.dispatch(req))
    }

    /// Mount the endpoint at `path` through the caller's router.
    pub fn handle<H, M>(self, mount: M, path: &str, handler: H)
    where
        H: Handler<B, P, R>,
        M: FnOnce(&str, RequestHandler),
    {
        info!(
            path = %path,
            content_types = ?self.registry.content_types(),
            accepts = ?self.registry.accepts(),
            params_reader = self.registry.has_params_reader(),
            "Endpoint registered"
        );
        mount(path, self.into_handler(handler));
    }
}

/// Build, validate and mount an endpoint in one step.
///
/// # Errors
///
/// Any [`ConfigError`] from [`EndpointBuilder::build`]; nothing is mounted in
/// that case.
pub fn handle<B, P, R, H, M, I>(
    mount: M,
    path: &str,
    handler: H,
    capabilities: I,
) -> Result<(), ConfigError>
where
    B: Payload,
    P: Payload,
    R: Payload,
    H: Handler<B, P, R>,
    M: FnOnce(&str, RequestHandler),
    I: IntoIterator<Item = Capability<B, P, R>>,
{
    let endpoint = EndpointBuilder::new()
        .with_all(capabilities)
        .build()
        .inspect_err(|err| error!(path = %path, error = %err, "Endpoint configuration rejected"))?;
    endpoint.handle(mount, path, handler);
    Ok(())
}
