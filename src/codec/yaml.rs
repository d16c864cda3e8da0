use super::{set_body, BodyReader, Writer};
use crate::error::{DecodeError, EncodeError};
use http::{Request, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Decodes `application/yaml` bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlBodyReader;

impl<B: DeserializeOwned + 'static> BodyReader<B> for YamlBodyReader {
    fn content_type(&self) -> &str {
        "application/yaml"
    }

    fn read(&self, req: &Request<Vec<u8>>) -> Result<B, DecodeError> {
        Ok(serde_yaml::from_slice(req.body())?)
    }
}

/// Encodes responses as `application/yaml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlWriter;

impl<R: Serialize + 'static> Writer<R> for YamlWriter {
    fn accept(&self) -> &str {
        "application/yaml"
    }

    fn write(&self, res: &mut Response<Vec<u8>>, value: &R) -> Result<(), EncodeError> {
        let body = serde_yaml::to_string(value)?;
        set_body(res, "application/yaml", body.into_bytes());
        Ok(())
    }
}
