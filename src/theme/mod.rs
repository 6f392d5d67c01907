//! Template engine
//!
//! Pages are rendered with Tera. Templates ship inside the binary; a
//! directory configured as `theme.path` replaces them wholesale, which is how
//! the site copy is customized without a rebuild.

use anyhow::{Context, Result};
use rust_embed::RustEmbed;
use serde::Serialize;
use std::error::Error as StdError;
use std::fs;
use std::path::Path;
use tera::{Context as TeraContext, Tera};

mod error;

pub use error::ThemeError;

#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*.html"]
struct EmbeddedTemplates;

/// Variables every page template receives
#[derive(Debug, Clone, Serialize)]
pub struct SiteVars {
    pub site_name: String,
    pub contact_email: String,
    pub measurement_id: Option<String>,
    pub request_path: String,
    pub year: i32,
}

/// Tera wrapper holding the site's templates
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Load templates from `override_dir` when given, else the embedded set
    pub fn new(override_dir: Option<&Path>) -> Result<Self> {
        let templates = match override_dir {
            Some(dir) => {
                if !dir.is_dir() {
                    return Err(ThemeError::NotFound(dir.display().to_string()).into());
                }
                let mut templates = Vec::new();
                collect_templates_from_dir(dir, dir, &mut templates)?;
                tracing::info!(path = %dir.display(), count = templates.len(), "loaded templates from disk");
                templates
            }
            None => embedded_templates()?,
        };

        let mut tera = Tera::default();
        tera.autoescape_on(vec![".html"]);
        tera.add_raw_templates(templates)
            .map_err(|e| ThemeError::TemplateError(describe(&e)))?;

        Ok(Self { tera })
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    /// Render a template, flattening Tera's error chain into the message
    pub fn render(&self, template: &str, context: &TeraContext) -> Result<String> {
        self.tera.render(template, context).map_err(|e| {
            ThemeError::TemplateError(format!("Failed to render '{}': {}", template, describe(&e))).into()
        })
    }

    /// Render with the site-wide variables added
    pub fn render_page(&self, template: &str, context: &TeraContext, site: &SiteVars) -> Result<String> {
        let mut full_context = context.clone();
        full_context.insert("site", site);
        self.render(template, &full_context)
    }

    /// Render the error page, falling back to bare HTML if that fails too
    pub fn render_error(&self, status: u16, message: &str, site: &SiteVars) -> String {
        let mut context = TeraContext::new();
        context.insert("status", &status);
        context.insert("message", message);

        match self.render_page("error.html", &context, site) {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(error = %e, "failed to render error template");
                format!(
                    "<!DOCTYPE html><html><head><title>{status}</title></head>\
                     <body><h1>{status}</h1><p>{}</p><p><a href=\"/\">Return home</a></p></body></html>",
                    tera::escape_html(message)
                )
            }
        }
    }
}

fn embedded_templates() -> Result<Vec<(String, String)>> {
    let mut templates = Vec::new();
    for name in EmbeddedTemplates::iter() {
        let file = EmbeddedTemplates::get(&name)
            .ok_or_else(|| ThemeError::NotFound(name.to_string()))?;
        let content = String::from_utf8(file.data.into_owned())
            .with_context(|| format!("Template is not UTF-8: {}", name))?;
        templates.push((name.to_string(), content));
    }
    Ok(templates)
}

/// Collect `*.html` files below `current_path`, named relative to `base_path`
fn collect_templates_from_dir(base_path: &Path, current_path: &Path, templates: &mut Vec<(String, String)>) -> Result<()> {
    for entry in fs::read_dir(current_path).map_err(ThemeError::IoError)? {
        let path = entry.map_err(ThemeError::IoError)?.path();

        if path.is_dir() {
            collect_templates_from_dir(base_path, &path, templates)?;
        } else if path.extension().is_some_and(|ext| ext == "html") {
            let relative_path = path
                .strip_prefix(base_path)
                .map_err(|_| ThemeError::TemplateError("Failed to get relative path".to_string()))?;
            let template_name = relative_path.to_string_lossy().replace('\\', "/");
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read template: {:?}", path))?;
            templates.push((template_name, content));
        }
    }
    Ok(())
}

fn describe(e: &tera::Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(s) = source {
        message.push_str(&format!("\n  Caused by: {}", s));
        source = s.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> SiteVars {
        SiteVars {
            site_name: "Olive of Wholeness".to_string(),
            contact_email: "info@olivesofwholeness.org".to_string(),
            measurement_id: None,
            request_path: "/".to_string(),
            year: 2024,
        }
    }

    #[test]
    fn test_embedded_templates_load() {
        let engine = TemplateEngine::new(None).unwrap();
        for name in [
            "base.html",
            "error.html",
            "home.html",
            "community.html",
            "admin/base.html",
            "admin/dashboard.html",
            "admin/analytics.html",
        ] {
            assert!(engine.has_template(name), "missing {}", name);
        }
    }

    #[test]
    fn test_static_pages_render() {
        let engine = TemplateEngine::new(None).unwrap();
        for name in ["about.html", "services.html"] {
            let html = engine.render_page(name, &TeraContext::new(), &site()).unwrap();
            assert!(html.contains("Olive of Wholeness"));
        }
    }

    #[test]
    fn test_error_page() {
        let engine = TemplateEngine::new(None).unwrap();
        let html = engine.render_error(404, "Page not found", &site());
        assert!(html.contains("404"));
        assert!(html.contains("Page not found"));
    }

    #[test]
    fn test_disk_override() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("admin")).unwrap();
        fs::write(dir.path().join("base.html"), "<main>{% block content %}{% endblock %}</main>").unwrap();
        fs::write(
            dir.path().join("error.html"),
            "{% extends \"base.html\" %}{% block content %}E{{ status }} {{ site.site_name }}{% endblock %}",
        )
        .unwrap();
        fs::write(dir.path().join("admin/extra.html"), "x").unwrap();

        let engine = TemplateEngine::new(Some(dir.path())).unwrap();
        assert!(engine.has_template("admin/extra.html"));
        assert!(!engine.has_template("home.html"));
        assert_eq!(
            engine.render_error(500, "boom", &site()),
            "<main>E500 Olive of Wholeness</main>"
        );
    }

    #[test]
    fn test_missing_override_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(TemplateEngine::new(Some(&dir.path().join("nope"))).is_err());
    }

    #[test]
    fn test_render_error_falls_back_to_plain_html() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("base.html"), "<p>only base</p>").unwrap();
        let engine = TemplateEngine::new(Some(dir.path())).unwrap();
        let html = engine.render_error(404, "<gone>", &site());
        assert!(html.contains("<h1>404</h1>"));
        assert!(html.contains("&lt;gone&gt;"));
    }
}
