//! # Parameter Binding
//!
//! Binding fills a typed parameter struct from three sources:
//!
//! - **path** captures produced by the router ([`PathParams`], attached to the
//!   request extensions by the router glue),
//! - the URL **query** string (first value wins for repeated names),
//! - named **ctx** values on the [`RequestContext`].
//!
//! The per-type binding code is generated at compile time by
//! `#[derive(Params)]`; it calls [`ParamSource::value`],
//! [`ParamSource::context`] and [`ParamSource::context_optional`] once per
//! annotated field.
//!
//! ## Coercion
//!
//! Path and query values are coerced with [`FromParam`], implemented for the
//! integer widths, floats, `bool`, `char`, `String` and `Option<T>`. A missing
//! value always resolves to `Default::default()` unless the field is marked
//! `required`. A value that fails to parse resolves to `Default::default()`
//! under [`BindPolicy::Lenient`] and fails with [`BindError::Invalid`] under
//! [`BindPolicy::Strict`].
//!
//! Context values are assigned only when the stored value has exactly the
//! field's type; a mismatch leaves the field at its default without error.

use crate::context::RequestContext;
use crate::error::{BindError, ParamError, ParamOrigin};
use http::Request;
use smallvec::SmallVec;
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, trace};

/// Maximum number of path/query parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage. Names are shared `Arc<str>` because
/// routers usually know them up front.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Path captures from the router's match result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(ParamVec);

impl PathParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<Arc<str>>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// Get a capture by name.
    ///
    /// Last write wins: for `/org/{id}/user/{id}` this returns the user id.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_ref(), v.as_str()))
    }
}

impl<K: Into<Arc<str>>, V: Into<String>> FromIterator<(K, V)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// What to do with a value that is present but fails to coerce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BindPolicy {
    /// Use the field's default and carry on.
    #[default]
    Lenient,
    /// Reject the request with `400 Bad Request`.
    Strict,
}

impl BindPolicy {
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "strict" => BindPolicy::Strict,
            _ => BindPolicy::Lenient,
        }
    }
}

/// Coercion from a raw path or query string into a field type.
pub trait FromParam: Default {
    fn from_param(raw: &str) -> Result<Self, ParamError>;
}

macro_rules! from_param_parse {
    ($($ty:ty => $expected:literal),* $(,)?) => {
        $(
            impl FromParam for $ty {
                fn from_param(raw: &str) -> Result<Self, ParamError> {
                    raw.trim().parse::<$ty>().map_err(|_| ParamError {
                        expected: $expected,
                        raw: raw.to_string(),
                    })
                }
            }
        )*
    };
}

from_param_parse!(
    i8 => "integer", i16 => "integer", i32 => "integer", i64 => "integer",
    i128 => "integer", isize => "integer",
    u8 => "unsigned integer", u16 => "unsigned integer", u32 => "unsigned integer",
    u64 => "unsigned integer", u128 => "unsigned integer", usize => "unsigned integer",
    f32 => "number", f64 => "number",
    bool => "boolean",
);

impl FromParam for String {
    fn from_param(raw: &str) -> Result<Self, ParamError> {
        Ok(raw.to_string())
    }
}

impl FromParam for char {
    fn from_param(raw: &str) -> Result<Self, ParamError> {
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(ParamError {
                expected: "single character",
                raw: raw.to_string(),
            }),
        }
    }
}

impl<T: FromParam> FromParam for Option<T> {
    fn from_param(raw: &str) -> Result<Self, ParamError> {
        T::from_param(raw).map(Some)
    }
}

/// Everything a binder may read for one request.
#[derive(Debug)]
pub struct ParamSource<'a> {
    path: Option<&'a PathParams>,
    query: ParamVec,
    ctx: &'a RequestContext,
    policy: BindPolicy,
}

impl<'a> ParamSource<'a> {
    /// `query` is the raw query string without the leading `?`.
    #[must_use]
    pub fn new(
        path: Option<&'a PathParams>,
        query: Option<&str>,
        ctx: &'a RequestContext,
        policy: BindPolicy,
    ) -> Self {
        let query: ParamVec = query
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .map(|(k, v)| (Arc::<str>::from(&*k), v.into_owned()))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            path,
            query,
            ctx,
            policy,
        }
    }

    /// Source over a request's path captures (extensions) and query string.
    #[must_use]
    pub fn from_request<T>(
        req: &'a Request<T>,
        ctx: &'a RequestContext,
        policy: BindPolicy,
    ) -> Self {
        Self::new(
            req.extensions().get::<PathParams>(),
            req.uri().query(),
            ctx,
            policy,
        )
    }

    #[must_use]
    pub fn policy(&self) -> BindPolicy {
        self.policy
    }

    #[must_use]
    pub fn context_ref(&self) -> &RequestContext {
        self.ctx
    }

    #[must_use]
    pub fn path(&self, name: &str) -> Option<&str> {
        self.path.and_then(|p| p.get(name))
    }

    /// First value of a query parameter.
    #[must_use]
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Bind a path or query value into `T`.
    pub fn value<T: FromParam>(
        &self,
        origin: ParamOrigin,
        name: &str,
        required: bool,
    ) -> Result<T, BindError> {
        let raw = match origin {
            ParamOrigin::Path => self.path(name),
            ParamOrigin::Query => self.query(name),
            ParamOrigin::Context => None,
        };
        let Some(raw) = raw else {
            if required {
                return Err(BindError::Missing {
                    origin,
                    name: name.to_string(),
                });
            }
            return Ok(T::default());
        };
        match T::from_param(raw) {
            Ok(v) => Ok(v),
            Err(source) => match self.policy {
                BindPolicy::Strict => Err(BindError::Invalid {
                    origin,
                    name: name.to_string(),
                    source,
                }),
                BindPolicy::Lenient => {
                    debug!(
                        origin = %origin,
                        name = %name,
                        error = %source,
                        "Parameter coercion failed, using default"
                    );
                    Ok(T::default())
                }
            },
        }
    }

    /// Bind a context value of exactly type `T`.
    pub fn context<T: Any + Clone + Default>(
        &self,
        name: &str,
        required: bool,
    ) -> Result<T, BindError> {
        if let Some(v) = self.ctx.get::<T>(name) {
            return Ok(v.clone());
        }
        if required {
            return Err(BindError::Missing {
                origin: ParamOrigin::Context,
                name: name.to_string(),
            });
        }
        if self.ctx.contains(name) {
            trace!(name = %name, "Context value type mismatch, skipped");
        }
        Ok(T::default())
    }

    /// Bind an optional context value; absent or mismatched yields `None`.
    #[must_use]
    pub fn context_optional<T: Any + Clone>(&self, name: &str) -> Option<T> {
        self.ctx.get::<T>(name).cloned()
    }
}

/// A parameter struct that knows how to bind itself from a [`ParamSource`].
///
/// Usually generated with `#[derive(Params)]`.
pub trait BindParams: Sized {
    fn bind(source: &ParamSource<'_>) -> Result<Self, BindError>;
}

impl BindParams for crate::Void {
    fn bind(_source: &ParamSource<'_>) -> Result<Self, BindError> {
        Ok(crate::Void)
    }
}

impl BindParams for () {
    fn bind(_source: &ParamSource<'_>) -> Result<Self, BindError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(pairs: &[(&str, &str)]) -> PathParams {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test]
    fn test_path_params_last_write_wins() {
        let p = path(&[("id", "org-1"), ("team", "t"), ("id", "user-9")]);
        assert_eq!(p.get("id"), Some("user-9"));
        assert_eq!(p.len(), 3);
        assert!(p.get("missing").is_none());
    }

    #[test]
    fn test_query_first_value_wins_and_decodes() {
        let ctx = RequestContext::new();
        let src = ParamSource::new(None, Some("tag=a%20b&tag=c"), &ctx, BindPolicy::Lenient);
        assert_eq!(src.query("tag"), Some("a b"));
    }

    #[test]
    fn test_lenient_malformed_integer_is_zero() {
        let ctx = RequestContext::new();
        let p = path(&[("id", "abc")]);
        let src = ParamSource::new(Some(&p), None, &ctx, BindPolicy::Lenient);
        let id: i64 = src.value(ParamOrigin::Path, "id", false).unwrap();
        assert_eq!(id, 0);
    }

    #[test]
    fn test_strict_malformed_integer_fails() {
        let ctx = RequestContext::new();
        let p = path(&[("id", "abc")]);
        let src = ParamSource::new(Some(&p), None, &ctx, BindPolicy::Strict);
        let err = src.value::<i64>(ParamOrigin::Path, "id", false).unwrap_err();
        assert!(matches!(err, BindError::Invalid { origin: ParamOrigin::Path, .. }));
        assert_eq!(
            err.to_string(),
            "invalid path parameter `id`: expected integer, got \"abc\""
        );
    }

    #[test]
    fn test_missing_required_fails_under_both_policies() {
        let ctx = RequestContext::new();
        for policy in [BindPolicy::Lenient, BindPolicy::Strict] {
            let src = ParamSource::new(None, None, &ctx, policy);
            let err = src.value::<String>(ParamOrigin::Query, "q", true).unwrap_err();
            assert_eq!(
                err,
                BindError::Missing {
                    origin: ParamOrigin::Query,
                    name: "q".into()
                }
            );
        }
    }

    #[test]
    fn test_option_fields_distinguish_missing() {
        let ctx = RequestContext::new();
        let src = ParamSource::new(None, Some("limit=10"), &ctx, BindPolicy::Lenient);
        let limit: Option<u32> = src.value(ParamOrigin::Query, "limit", false).unwrap();
        let offset: Option<u32> = src.value(ParamOrigin::Query, "offset", false).unwrap();
        assert_eq!(limit, Some(10));
        assert_eq!(offset, None);
    }

    #[test]
    fn test_context_type_mismatch_is_skipped() {
        let ctx = RequestContext::new().with_value("user", 7i32);
        let src = ParamSource::new(None, None, &ctx, BindPolicy::Strict);
        let user: String = src.context("user", false).unwrap();
        assert_eq!(user, "");
        assert_eq!(src.context_optional::<i32>("user"), Some(7));
        assert_eq!(src.context_optional::<String>("user"), None);
    }

    #[test]
    fn test_char_and_bool_coercion() {
        assert_eq!(char::from_param("x"), Ok('x'));
        assert!(char::from_param("xy").is_err());
        assert_eq!(bool::from_param("true"), Ok(true));
        assert!(bool::from_param("yes").is_err());
    }

    #[test]
    fn test_bind_policy_parse() {
        assert_eq!(BindPolicy::parse("STRICT"), BindPolicy::Strict);
        assert_eq!(BindPolicy::parse("lenient"), BindPolicy::Lenient);
        assert_eq!(BindPolicy::parse("other"), BindPolicy::Lenient);
    }
}
