//! Template rendering: layout resolution, template model, renderer trait.
//!
//! The pipeline talks to rendering through [`TemplateRenderer`]. A
//! renderer loads every template from storage once at initialization; the
//! render path itself performs no I/O.
//!
//! # Template model
//!
//! Every render receives a JSON model with these top-level keys:
//!
//! | Key               | Content                                        |
//! |-------------------|------------------------------------------------|
//! | `site`            | title, description, url, language, author, extra |
//! | `page`            | the item: title, url, content, date, tags, ... |
//! | `seo`             | computed title/description/canonical           |
//! | `previous`/`next` | adjacent post links (posts only)               |
//! | `posts`           | member post summaries (lists only)             |
//! | `pager`           | pagination state (lists only)                  |

mod tera;

pub use self::tera::TeraRenderer;

use crate::config::SiteConfig;
use crate::site::{ContentItem, ItemKind, SiteContext};
use crate::storage::{Storage, StorageError};
use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Rendering errors
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template not found: `{0}`")]
    TemplateNotFound(String),

    #[error("renderer initialization failed: {0}")]
    Init(String),

    #[error("render failed: {0}")]
    Render(String),

    #[error("template storage error")]
    Storage(#[from] StorageError),
}

// ============================================================================
// Renderer Trait
// ============================================================================

/// Template engine behind the render stage.
#[async_trait]
pub trait TemplateRenderer: Send + Sync {
    /// Load and compile all templates from storage. Called exactly once,
    /// before any render.
    async fn initialize(
        &mut self,
        config: &SiteConfig,
        storage: &dyn Storage,
    ) -> Result<(), RenderError>;

    /// Render the template registered under `key` with the given model.
    async fn render(&self, key: &str, model: &Value) -> Result<String, RenderError>;
}

// ============================================================================
// Layout Resolution
// ============================================================================

/// Template key for an item: explicit `layout` from frontmatter (with
/// `.html` appended when it has no extension), else the kind default.
pub fn resolve_layout(item: &ContentItem) -> String {
    if let Some(layout) = &item.meta.layout {
        if layout.contains('.') {
            return layout.clone();
        }
        return format!("{layout}.html");
    }
    match item.kind {
        ItemKind::Post(_) => "post.html".to_string(),
        ItemKind::Page => "page.html".to_string(),
        ItemKind::List(_) => "list.html".to_string(),
    }
}

// ============================================================================
// Template Model
// ============================================================================

/// Build the JSON model for rendering one item.
pub fn render_model(item: &ContentItem, ctx: &SiteContext) -> Value {
    let mut model = json!({
        "site": site_model(ctx),
        "page": page_model(item, ctx),
        "seo": item.seo,
    });

    match &item.kind {
        ItemKind::Post(data) => {
            model["previous"] = neighbor_model(data.previous, ctx);
            model["next"] = neighbor_model(data.next, ctx);
        }
        ItemKind::List(data) => {
            let posts: Vec<Value> = data
                .posts
                .iter()
                .filter_map(|&i| ctx.posts.get(i))
                .map(|post| page_model(post, ctx))
                .collect();
            model["posts"] = Value::Array(posts);
            model["pager"] = json!(data.pager);
            model["taxonomy"] = json!(data.taxonomy);
            model["term"] = json!(data.term);
        }
        ItemKind::Page => {}
    }

    model
}

fn site_model(ctx: &SiteContext) -> Value {
    json!({
        "title": ctx.config.base.title,
        "description": ctx.config.base.description,
        "author": ctx.config.base.author,
        "url": ctx.config.base.url,
        "language": ctx.config.base.language,
        "extra": ctx.config.extra,
    })
}

fn page_model(item: &ContentItem, _ctx: &SiteContext) -> Value {
    let mut page = json!({
        "title": item.meta.title,
        "url": item.url,
        "content": item.body,
        "categories": item.meta.categories,
        "tags": item.meta.tags,
        "extra": item.meta.extra,
    });

    if let Some(date) = item.date() {
        page["date"] = json!(date.format("%Y-%m-%d").to_string());
    }
    if let ItemKind::Post(data) = &item.kind {
        page["summary"] = json!(data.summary);
        page["reading_time"] = json!(data.reading_time);
    } else if let Some(summary) = &item.meta.summary {
        page["summary"] = json!(summary);
    }

    page
}

fn neighbor_model(index: Option<usize>, ctx: &SiteContext) -> Value {
    match index.and_then(|i| ctx.posts.get(i)) {
        Some(post) => json!({
            "title": post.meta.title,
            "url": post.url,
        }),
        None => Value::Null,
    }
}

// ============================================================================
// Tests
// ============================================================================
