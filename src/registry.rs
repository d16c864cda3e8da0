//! # Codec Registry
//!
//! A [`CodecRegistry`] holds the lookup tables one endpoint dispatches
//! through: body readers keyed by content type, writers keyed by accept type
//! and at most one parameter binder. It is filled while the endpoint is being
//! built and is read-only once the endpoint exists.
//!
//! Capabilities are handed over as [`Capability`] values. The built-in codecs
//! convert with `.into()`; custom ones go through [`Capability::body_reader`],
//! [`Capability::writer`] and [`Capability::params_reader`]. Registering a
//! second capability under an existing key replaces the first.

use crate::codec::{
    BodyReader, FnParamsReader, FormBodyReader, JsonBodyReader, JsonWriter, ParamsReader,
    TagParamsReader, TemplateWriter, Writer, YamlBodyReader, YamlWriter,
};
use crate::error::{BindError, ConfigError};
use crate::negotiate;
use crate::params::{BindParams, ParamSource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// One pluggable codec, tagged with its role.
pub enum Capability<B, P, R> {
    BodyReader {
        type_name: &'static str,
        reader: Arc<dyn BodyReader<B>>,
    },
    Writer {
        type_name: &'static str,
        writer: Arc<dyn Writer<R>>,
    },
    ParamsReader {
        type_name: &'static str,
        reader: Arc<dyn ParamsReader<P>>,
    },
    /// A nested list, flattened on registration.
    Bundle(Vec<Capability<B, P, R>>),
}

impl<B, P, R> Capability<B, P, R> {
    pub fn body_reader<T: BodyReader<B>>(reader: T) -> Self {
        Capability::BodyReader {
            type_name: std::any::type_name::<T>(),
            reader: Arc::new(reader),
        }
    }

    pub fn writer<T: Writer<R>>(writer: T) -> Self {
        Capability::Writer {
            type_name: std::any::type_name::<T>(),
            writer: Arc::new(writer),
        }
    }

    pub fn params_reader<T: ParamsReader<P>>(reader: T) -> Self {
        Capability::ParamsReader {
            type_name: std::any::type_name::<T>(),
            reader: Arc::new(reader),
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Capability::BodyReader { type_name, .. }
            | Capability::Writer { type_name, .. }
            | Capability::ParamsReader { type_name, .. } => *type_name,
            Capability::Bundle(_) => "Bundle",
        }
    }
}

impl<B: 'static, P, R: 'static> fmt::Debug for Capability<B, P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::BodyReader { type_name, reader } => f
                .debug_struct("BodyReader")
                .field("type", type_name)
                .field("content_type", &reader.content_type())
                .finish(),
            Capability::Writer { type_name, writer } => f
                .debug_struct("Writer")
                .field("type", type_name)
                .field("accept", &writer.accept())
                .finish(),
            Capability::ParamsReader { type_name, .. } => f
                .debug_struct("ParamsReader")
                .field("type", type_name)
                .finish(),
            Capability::Bundle(items) => f.debug_list().entries(items).finish(),
        }
    }
}

impl<B, P, R> From<Vec<Capability<B, P, R>>> for Capability<B, P, R> {
    fn from(items: Vec<Capability<B, P, R>>) -> Self {
        Capability::Bundle(items)
    }
}

impl<B: DeserializeOwned + 'static, P, R> From<JsonBodyReader> for Capability<B, P, R> {
    fn from(reader: JsonBodyReader) -> Self {
        Capability::body_reader(reader)
    }
}

impl<B: DeserializeOwned + 'static, P, R> From<FormBodyReader> for Capability<B, P, R> {
    fn from(reader: FormBodyReader) -> Self {
        Capability::body_reader(reader)
    }
}

impl<B: DeserializeOwned + 'static, P, R> From<YamlBodyReader> for Capability<B, P, R> {
    fn from(reader: YamlBodyReader) -> Self {
        Capability::body_reader(reader)
    }
}

impl<B, P, R: Serialize + 'static> From<JsonWriter> for Capability<B, P, R> {
    fn from(writer: JsonWriter) -> Self {
        Capability::writer(writer)
    }
}

impl<B, P, R: Serialize + 'static> From<YamlWriter> for Capability<B, P, R> {
    fn from(writer: YamlWriter) -> Self {
        Capability::writer(writer)
    }
}

impl<B, P, R: Serialize + 'static> From<TemplateWriter> for Capability<B, P, R> {
    fn from(writer: TemplateWriter) -> Self {
        Capability::writer(writer)
    }
}

impl<B, P: BindParams + 'static, R> From<TagParamsReader> for Capability<B, P, R> {
    fn from(reader: TagParamsReader) -> Self {
        Capability::params_reader(reader)
    }
}

impl<B, P, R, F> From<FnParamsReader<F>> for Capability<B, P, R>
where
    F: Fn(&ParamSource<'_>) -> Result<P, BindError> + Send + Sync + 'static,
{
    fn from(reader: FnParamsReader<F>) -> Self {
        Capability::params_reader(reader)
    }
}

/// The zero-configuration capabilities: a JSON body reader and the tag binder.
///
/// Writers are never defaulted; an endpoint with a response must name its
/// writers explicitly.
#[must_use]
pub fn defaults<B, P, R>() -> Vec<Capability<B, P, R>>
where
    B: DeserializeOwned + 'static,
    P: BindParams + 'static,
{
    vec![JsonBodyReader.into(), TagParamsReader.into()]
}

/// Keyed codec tables for one endpoint.
pub struct CodecRegistry<B, P, R> {
    body_readers: HashMap<String, Arc<dyn BodyReader<B>>>,
    writers: HashMap<String, Arc<dyn Writer<R>>>,
    params_reader: Option<Arc<dyn ParamsReader<P>>>,
}

impl<B: 'static, P, R: 'static> Default for CodecRegistry<B, P, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: 'static, P, R: 'static> CodecRegistry<B, P, R> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            body_readers: HashMap::new(),
            writers: HashMap::new(),
            params_reader: None,
        }
    }

    /// Insert a capability under its declared key.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidCapability`] when a reader or writer declares a
    /// key that is not a `type/subtype` media type.
    pub fn register(&mut self, capability: Capability<B, P, R>) -> Result<(), ConfigError> {
        match capability {
            Capability::BodyReader { type_name, reader } => {
                let key = checked_key(type_name, reader.content_type())?;
                if self.body_readers.insert(key.clone(), reader).is_some() {
                    warn!(content_type = %key, reader = type_name, "Replaced existing body reader");
                } else {
                    debug!(content_type = %key, reader = type_name, "Body reader registered");
                }
            }
            Capability::Writer { type_name, writer } => {
                let key = checked_key(type_name, writer.accept())?;
                if self.writers.insert(key.clone(), writer).is_some() {
                    warn!(accept = %key, writer = type_name, "Replaced existing writer");
                } else {
                    debug!(accept = %key, writer = type_name, "Writer registered");
                }
            }
            Capability::ParamsReader { type_name, reader } => {
                if self.params_reader.replace(reader).is_some() {
                    warn!(reader = type_name, "Replaced existing params reader");
                } else {
                    debug!(reader = type_name, "Params reader registered");
                }
            }
            Capability::Bundle(items) => {
                for item in items {
                    self.register(item)?;
                }
            }
        }
        Ok(())
    }

    /// Reader for a content type (compared by essence).
    #[must_use]
    pub fn body_reader(&self, content_type: &str) -> Option<&Arc<dyn BodyReader<B>>> {
        self.body_readers.get(&negotiate::essence(content_type))
    }

    /// Writer for an accept type (compared by essence).
    #[must_use]
    pub fn writer(&self, accept: &str) -> Option<&Arc<dyn Writer<R>>> {
        self.writers.get(&negotiate::essence(accept))
    }

    #[must_use]
    pub fn params_reader(&self) -> Option<&Arc<dyn ParamsReader<P>>> {
        self.params_reader.as_ref()
    }

    #[must_use]
    pub fn has_body_readers(&self) -> bool {
        !self.body_readers.is_empty()
    }

    #[must_use]
    pub fn has_writers(&self) -> bool {
        !self.writers.is_empty()
    }

    #[must_use]
    pub fn has_params_reader(&self) -> bool {
        self.params_reader.is_some()
    }

    /// Registered content types, sorted.
    #[must_use]
    pub fn content_types(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.body_readers.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Registered accept types, sorted.
    #[must_use]
    pub fn accepts(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.writers.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl<B: 'static, P, R: 'static> fmt::Debug for CodecRegistry<B, P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("content_types", &self.content_types())
            .field("accepts", &self.accepts())
            .field("params_reader", &self.has_params_reader())
            .finish()
    }
}

fn checked_key(type_name: &'static str, key: &str) -> Result<String, ConfigError> {
    if negotiate::is_media_type(key) {
        Ok(negotiate::essence(key))
    } else {
        Err(ConfigError::InvalidCapability {
            type_name,
            key: key.to_string(),
        })
    }
}
