use super::{set_body, Writer};
use crate::error::EncodeError;
use http::Response;
use minijinja::Environment;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Renders responses as `text/html` through a named template.
///
/// The environment is shared, so one set of loaded templates can back many
/// endpoints, each naming the template it renders.
#[derive(Clone)]
pub struct TemplateWriter {
    env: Arc<Environment<'static>>,
    name: String,
}

impl TemplateWriter {
    pub fn new(env: Arc<Environment<'static>>, name: impl Into<String>) -> Self {
        Self {
            env,
            name: name.into(),
        }
    }

    #[must_use]
    pub fn template_name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for TemplateWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateWriter")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<R: Serialize + 'static> Writer<R> for TemplateWriter {
    fn accept(&self) -> &str {
        "text/html"
    }

    fn write(&self, res: &mut Response<Vec<u8>>, value: &R) -> Result<(), EncodeError> {
        let html = self.env.get_template(&self.name)?.render(value)?;
        set_body(res, "text/html; charset=utf-8", html.into_bytes());
        Ok(())
    }
}
