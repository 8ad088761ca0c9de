//! Template rendering for actions with a rendered-template directive.

use std::fmt;
use std::path::Path;

use minijinja::{Environment, ErrorKind};
use serde_json::Value;

use hermes_core::{HermesError, HttpError};

/// Named templates rendered with a handler result as context.
///
/// Templates come from a directory loader, from sources added in code, or
/// both. Sources added in code shadow files of the same name.
pub struct Templates {
    env: Environment<'static>,
    has_loader: bool,
}

impl Templates {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
            has_loader: false,
        }
    }

    /// Loads templates lazily from `dir`.
    pub fn load_dir(&mut self, dir: &Path) -> Result<(), HermesError> {
        if !dir.is_dir() {
            return Err(HermesError::Template {
                name: dir.display().to_string(),
                message: "template directory does not exist".to_string(),
            });
        }
        self.env.set_loader(minijinja::path_loader(dir.to_path_buf()));
        self.has_loader = true;
        tracing::debug!(dir = %dir.display(), "template directory registered");
        Ok(())
    }

    /// Adds a template from source.
    pub fn add(&mut self, name: impl Into<String>, source: impl Into<String>) -> Result<(), HermesError> {
        let name = name.into();
        self.env
            .add_template_owned(name.clone(), source.into())
            .map_err(|e| HermesError::Template {
                name,
                message: e.to_string(),
            })
    }

    /// Renders `name` with `context`.
    pub fn render(&self, name: &str, context: &Value) -> Result<String, HttpError> {
        let template = self.env.get_template(name).map_err(|e| {
            let message = if e.kind() == ErrorKind::TemplateNotFound {
                format!("template `{name}` not found")
            } else {
                format!("template `{name}` failed to load")
            };
            HttpError::internal(message).with_source(e)
        })?;
        template
            .render(context)
            .map_err(|e| HttpError::internal(format!("template `{name}` failed to render")).with_source(e))
    }

    /// Returns true if a template directory is configured.
    #[must_use]
    pub fn has_loader(&self) -> bool {
        self.has_loader
    }
}

impl Default for Templates {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Templates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Templates")
            .field("has_loader", &self.has_loader)
            .finish_non_exhaustive()
    }
}
