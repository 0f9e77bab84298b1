//! Template rendering for Stencil.
//! Wraps a MiniJinja environment behind the [`TemplateRenderer`] trait so the
//! engine can be driven by any renderer in tests.
use crate::error::Result;
use cruet::Inflector;
use minijinja::Environment;
use std::path::Path;

/// Trait for template rendering engines.
///
/// Implementations must be pure: the same `(template, context)` pair always
/// renders to the same text.
pub trait TemplateRenderer {
    /// Renders a template string with the given context.
    ///
    /// # Arguments
    /// * `template` - Template string to render
    /// * `context` - Context variables for rendering
    ///
    /// # Returns
    /// * `Result<String>` - Rendered template string
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String>;

    /// Reads the template at `path` and renders it with the given context.
    fn render_file(&self, path: &Path, context: &serde_json::Value) -> Result<String> {
        let template = std::fs::read_to_string(path)?;
        self.render(&template, context)
    }
}

/// MiniJinja-based template rendering engine.
pub struct MiniJinjaRenderer {
    /// MiniJinja environment instance
    env: Environment<'static>,
}

impl MiniJinjaRenderer {
    /// Creates a new renderer with the identifier case filters registered.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        env.add_filter("snake_case", |value: String| value.to_snake_case());
        env.add_filter("camel_case", |value: String| value.to_camel_case());
        env.add_filter("pascal_case", |value: String| value.to_pascal_case());
        env.add_filter("kebab_case", |value: String| value.to_kebab_case());
        env.add_filter("title_case", |value: String| value.to_title_case());
        Self { env }
    }
}

impl Default for MiniJinjaRenderer {
    fn default() -> Self {
        MiniJinjaRenderer::new()
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    /// Renders a template string using MiniJinja.
    ///
    /// # Errors
    /// * `Error::MinijinjaError` if the template fails to parse or render
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String> {
        let mut env = self.env.clone();
        env.add_template("temp", template)?;

        let tmpl = env.get_template("temp")?;

        Ok(tmpl.render(context)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keeps_trailing_newline() {
        let renderer = MiniJinjaRenderer::new();
        let result = renderer.render("name: {{ name }}\n", &json!({"name": "demo"})).unwrap();
        assert_eq!(result, "name: demo\n");
    }

    #[test]
    fn test_case_filters() {
        let renderer = MiniJinjaRenderer::new();
        let context = json!({"name": "my_cool_app"});

        assert_eq!(renderer.render("{{ name | pascal_case }}", &context).unwrap(), "MyCoolApp");
        assert_eq!(renderer.render("{{ name | camel_case }}", &context).unwrap(), "myCoolApp");
        assert_eq!(renderer.render("{{ name | kebab_case }}", &context).unwrap(), "my-cool-app");
    }
}
