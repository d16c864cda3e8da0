use super::ParamsReader;
use crate::error::BindError;
use crate::params::{BindParams, ParamSource};
use std::fmt;

/// The default binder: delegates to the `#[derive(Params)]` implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagParamsReader;

impl<P: BindParams + 'static> ParamsReader<P> for TagParamsReader {
    fn bind(&self, source: &ParamSource<'_>) -> Result<P, BindError> {
        P::bind(source)
    }
}

/// A binder written by hand as a closure.
///
/// ```rust
/// use handlr::{BindError, FnParamsReader, ParamSource};
///
/// let reader = FnParamsReader::new(|src: &ParamSource<'_>| {
///     src.path("id")
///         .and_then(|v| v.parse::<u64>().ok())
///         .ok_or_else(|| BindError::Other("id must be a positive integer".into()))
/// });
/// # let _ = reader;
/// ```
#[derive(Clone)]
pub struct FnParamsReader<F>(F);

impl<F> FnParamsReader<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> fmt::Debug for FnParamsReader<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnParamsReader")
    }
}

impl<P, F> ParamsReader<P> for FnParamsReader<F>
where
    F: Fn(&ParamSource<'_>) -> Result<P, BindError> + Send + Sync + 'static,
{
    fn bind(&self, source: &ParamSource<'_>) -> Result<P, BindError> {
        (self.0)(source)
    }
}
