use super::{set_body, BodyReader, Writer};
use crate::error::{DecodeError, EncodeError};
use http::{Request, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Decodes `application/json` bodies with serde.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBodyReader;

impl<B: DeserializeOwned + 'static> BodyReader<B> for JsonBodyReader {
    fn content_type(&self) -> &str {
        "application/json"
    }

    fn read(&self, req: &Request<Vec<u8>>) -> Result<B, DecodeError> {
        Ok(serde_json::from_slice(req.body())?)
    }
}

/// Encodes responses as `application/json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonWriter;

impl<R: Serialize + 'static> Writer<R> for JsonWriter {
    fn accept(&self) -> &str {
        "application/json"
    }

    fn write(&self, res: &mut Response<Vec<u8>>, value: &R) -> Result<(), EncodeError> {
        let body = serde_json::to_vec(value)?;
        set_body(res, "application/json", body);
        Ok(())
    }
}
