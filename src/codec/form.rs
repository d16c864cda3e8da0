use super::BodyReader;
use crate::error::DecodeError;
use http::Request;
use serde::de::value::{Error, MapDeserializer, SeqDeserializer, StringDeserializer};
use serde::de::{self, DeserializeOwned, IntoDeserializer, Unexpected, Visitor};
use serde::forward_to_deserialize_any;

/// Decodes `application/x-www-form-urlencoded` bodies.
///
/// Every name collects all of its values. A sequence field (`Vec<T>`,
/// tuples) takes them all, so `tags=x` binds `vec!["x"]` just like
/// `tags=x&tags=y` binds both. Scalar fields take the single value and parse
/// it into the field's type; a repeated name bound to a scalar is an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormBodyReader;

impl<B: DeserializeOwned + 'static> BodyReader<B> for FormBodyReader {
    fn content_type(&self) -> &str {
        "application/x-www-form-urlencoded"
    }

    fn read(&self, req: &Request<Vec<u8>>) -> Result<B, DecodeError> {
        let mut fields: Vec<(String, FormValue)> = Vec::new();
        for (k, v) in url::form_urlencoded::parse(req.body()) {
            match fields.iter_mut().find(|(name, _)| *name == k) {
                Some((_, values)) => values.0.push(v.into_owned()),
                None => fields.push((k.into_owned(), FormValue(vec![v.into_owned()]))),
            }
        }
        Ok(B::deserialize(MapDeserializer::<_, Error>::new(fields.into_iter()))?)
    }
}

/// All values submitted under one form name, in body order.
struct FormValue(Vec<String>);

impl FormValue {
    fn single(self) -> Result<String, Error> {
        let len = self.0.len();
        let mut values = self.0.into_iter();
        match (values.next(), values.next()) {
            (Some(value), None) => Ok(value),
            _ => Err(de::Error::invalid_length(len, &"a single value")),
        }
    }

    fn visit_all<'de, V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        let items = self.0.into_iter().map(|v| FormValue(vec![v]));
        let mut seq = SeqDeserializer::<_, Error>::new(items);
        let value = visitor.visit_seq(&mut seq)?;
        seq.end()?;
        Ok(value)
    }
}

impl<'de> IntoDeserializer<'de, Error> for FormValue {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

macro_rules! deserialize_parsed {
    ($($method:ident => $visit:ident,)*) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
            let raw = self.single()?;
            match raw.trim().parse() {
                Ok(value) => visitor.$visit(value),
                Err(_) => Err(de::Error::invalid_value(Unexpected::Str(&raw), &visitor)),
            }
        }
    )*};
}

impl<'de> de::Deserializer<'de> for FormValue {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        if self.0.len() == 1 {
            visitor.visit_string(self.single()?)
        } else {
            self.visit_all(visitor)
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        let raw = self.single()?;
        match raw.trim() {
            "true" | "on" | "1" => visitor.visit_bool(true),
            "false" | "off" | "0" => visitor.visit_bool(false),
            _ => Err(de::Error::invalid_value(Unexpected::Str(&raw), &visitor)),
        }
    }

    deserialize_parsed! {
        deserialize_i8 => visit_i8,
        deserialize_i16 => visit_i16,
        deserialize_i32 => visit_i32,
        deserialize_i64 => visit_i64,
        deserialize_u8 => visit_u8,
        deserialize_u16 => visit_u16,
        deserialize_u32 => visit_u32,
        deserialize_u64 => visit_u64,
        deserialize_f32 => visit_f32,
        deserialize_f64 => visit_f64,
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        self.visit_all(visitor)
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Error> {
        self.visit_all(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Error> {
        self.visit_all(visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        let raw: StringDeserializer<Error> = self.single()?.into_deserializer();
        raw.deserialize_enum(name, variants, visitor)
    }

    forward_to_deserialize_any! {
        char str string bytes byte_buf unit unit_struct map struct identifier ignored_any
    }
}
