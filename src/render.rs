use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use minijinja::{Environment, UndefinedBehavior};
use thiserror::Error;

use crate::view::TaskView;

const TEMPLATE_NAME: &str = "task";

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("reading template {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid template: {0}")]
    Syntax(#[from] minijinja::Error),
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("template execution failed: {0}")]
    Template(#[from] minijinja::Error),
    #[error("{0}")]
    Other(String),
}

/// Turns one task view into one document.
pub trait DocumentRenderer {
    fn render(&self, view: &TaskView) -> Result<Vec<u8>, RenderError>;
}

impl<T: DocumentRenderer + ?Sized> DocumentRenderer for &T {
    fn render(&self, view: &TaskView) -> Result<Vec<u8>, RenderError> {
        (**self).render(view)
    }
}

impl<T: DocumentRenderer + ?Sized> DocumentRenderer for Box<T> {
    fn render(&self, view: &TaskView) -> Result<Vec<u8>, RenderError> {
        (**self).render(view)
    }
}

impl<T: DocumentRenderer + ?Sized> DocumentRenderer for Arc<T> {
    fn render(&self, view: &TaskView) -> Result<Vec<u8>, RenderError> {
        (**self).render(view)
    }
}

/// A parsed minijinja template. Undefined variables fail the render.
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl TemplateRenderer {
    pub fn from_source(source: impl Into<String>) -> Result<Self, TemplateError> {
        let source: String = source.into();
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        env.add_template_owned(TEMPLATE_NAME, source)?;
        Ok(Self { env })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, TemplateError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| TemplateError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("loaded template from {}", path.display());
        Self::from_source(source)
    }
}

impl DocumentRenderer for TemplateRenderer {
    fn render(&self, view: &TaskView) -> Result<Vec<u8>, RenderError> {
        let template = self.env.get_template(TEMPLATE_NAME)?;
        Ok(template.render(view)?.into_bytes())
    }
}
