//! Tera-backed template renderer.

use super::{RenderError, TemplateRenderer};
use crate::config::SiteConfig;
use crate::log;
use crate::storage::Storage;
use async_trait::async_trait;
use serde_json::Value;
use tera::{Context, Tera};

/// Renders through [`tera`], with every template loaded from storage at
/// initialization.
///
/// Templates from `build.templates` register under their path relative to
/// that directory; shared partials from `build.includes` register under
/// `includes/<name>` so layouts can `{% include "includes/nav.html" %}`.
#[derive(Default)]
pub struct TeraRenderer {
    tera: Tera,
}

impl TeraRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    async fn collect_templates(
        storage: &dyn Storage,
        dir: &str,
        prefix: &str,
    ) -> Result<Vec<(String, String)>, RenderError> {
        let mut templates = Vec::new();
        for path in storage.list_files(dir, "*", true).await? {
            let relative = path
                .strip_prefix(dir)
                .map(|r| r.trim_start_matches('/'))
                .unwrap_or(&path);
            let key = if prefix.is_empty() {
                relative.to_string()
            } else {
                format!("{prefix}/{relative}")
            };
            let content = storage.read_text(&path).await?;
            templates.push((key, content));
        }
        Ok(templates)
    }
}

#[async_trait]
impl TemplateRenderer for TeraRenderer {
    async fn initialize(
        &mut self,
        config: &SiteConfig,
        storage: &dyn Storage,
    ) -> Result<(), RenderError> {
        let mut templates =
            Self::collect_templates(storage, &config.build.templates, "").await?;
        templates
            .extend(Self::collect_templates(storage, &config.build.includes, "includes").await?);

        log!("render"; "loaded {} templates", templates.len());

        let mut tera = Tera::default();
        tera.add_raw_templates(templates)
            .map_err(|e| RenderError::Init(e.to_string()))?;
        self.tera = tera;
        Ok(())
    }

    async fn render(&self, key: &str, model: &Value) -> Result<String, RenderError> {
        if !self.tera.get_template_names().any(|name| name == key) {
            return Err(RenderError::TemplateNotFound(key.to_string()));
        }
        let context =
            Context::from_serialize(model).map_err(|e| RenderError::Render(e.to_string()))?;
        self.tera
            .render(key, &context)
            .map_err(|e| RenderError::Render(format!("`{key}`: {e}")))
    }
}
