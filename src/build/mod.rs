//! The build pipeline orchestrator.
//!
//! One [`SiteBuilder::build`] call runs the whole staged pipeline over a
//! source and an output storage:
//!
//! ```text
//! config → PreBuild → discover → PostContentProcessing → postprocess
//!        → listing → render → PostRender → assets → PostBuild
//!        → BuildComplete
//! ```
//!
//! Failure policy: configuration load, renderer initialization and
//! directory listings are fatal; everything scoped to one item (a file, a
//! template render, a plugin call) is logged, counted and skipped.
//! Cancellation is cooperative and observed between stages and items; a
//! cancelled build reports what it finished, never an error.

mod discover;
mod listing;
mod postprocess;

use crate::assets::{AssetCompiler, CssCompiler, OutputStyle};
use crate::config::{ConfigOverrides, SiteConfig};
use crate::content::ParserRegistry;
use crate::log;
use crate::plugin::{Dispatch, PipelineStage, Plugin, PluginDispatcher};
use crate::render::{render_model, resolve_layout, TemplateRenderer, TeraRenderer};
use crate::site::SiteContext;
use crate::storage::{combine, Storage};
use anyhow::Context;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Outcome Types
// ============================================================================

/// Stage-level control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Cancelled,
}

/// How a build ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    Complete,
    Cancelled,
}

/// Summary of one build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub outcome: BuildOutcome,
    /// Per-item failures logged during the build
    pub item_errors: usize,
    pub posts: usize,
    pub pages: usize,
    pub lists: usize,
}

// ============================================================================
// Builder
// ============================================================================

/// Owns the pipeline collaborators and runs builds.
pub struct SiteBuilder {
    parsers: ParserRegistry,
    renderer: Box<dyn TemplateRenderer>,
    compiler: Box<dyn AssetCompiler>,
    plugins: PluginDispatcher,
    overrides: ConfigOverrides,
    minify: bool,
}

impl SiteBuilder {
    /// Builder with the default collaborators: markdown and HTML parsers,
    /// the Tera renderer, the plain-CSS compiler, no plugins.
    pub fn new() -> Self {
        Self {
            parsers: ParserRegistry::with_defaults(),
            renderer: Box::new(TeraRenderer::new()),
            compiler: Box::new(CssCompiler::new()),
            plugins: PluginDispatcher::new(),
            overrides: ConfigOverrides::default(),
            minify: false,
        }
    }

    pub fn with_renderer(mut self, renderer: Box<dyn TemplateRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_compiler(mut self, compiler: Box<dyn AssetCompiler>) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn register_plugin(&mut self, plugin: Arc<dyn Plugin>) {
        self.plugins.register(plugin);
    }

    pub fn set_overrides(&mut self, overrides: ConfigOverrides) {
        self.overrides = overrides;
    }

    pub fn set_minify(&mut self, minify: bool) {
        self.minify = minify;
    }

    /// Run one full build.
    pub async fn build(
        &mut self,
        config_path: &str,
        source: &dyn Storage,
        output: &dyn Storage,
        cancel: &CancellationToken,
    ) -> anyhow::Result<BuildReport> {
        let started = std::time::Instant::now();

        let mut config = SiteConfig::load(source, config_path)
            .await
            .context("loading configuration")?;
        config.apply_overrides(self.overrides);
        config.validate().context("validating configuration")?;

        let mut ctx = SiteContext::new(config);

        self.renderer
            .initialize(&ctx.config, source)
            .await
            .context("initializing template renderer")?;

        macro_rules! checkpoint {
            ($stage:expr) => {
                if self
                    .plugins
                    .dispatch($stage, &mut ctx, source, output, cancel)
                    .await
                    == Dispatch::Cancelled
                {
                    return Ok(Self::report(&ctx, BuildOutcome::Cancelled));
                }
            };
        }

        checkpoint!(PipelineStage::PreBuild);

        if discover::discover(&mut ctx, &self.parsers, source, cancel).await? == Flow::Cancelled {
            return Ok(Self::report(&ctx, BuildOutcome::Cancelled));
        }

        checkpoint!(PipelineStage::PostContentProcessing);

        postprocess::postprocess(&mut ctx);
        listing::generate_lists(&mut ctx);

        if self.render_all(&mut ctx, output, cancel).await? == Flow::Cancelled {
            return Ok(Self::report(&ctx, BuildOutcome::Cancelled));
        }

        checkpoint!(PipelineStage::PostRender);

        if self.compile_styles(&mut ctx, source, output).await? == Flow::Cancelled
            || Self::copy_static(&mut ctx, source, output, cancel).await? == Flow::Cancelled
        {
            return Ok(Self::report(&ctx, BuildOutcome::Cancelled));
        }

        checkpoint!(PipelineStage::PostBuild);
        checkpoint!(PipelineStage::BuildComplete);

        log!("build";
            "done in {:.2?}: {} posts, {} pages, {} lists, {} errors",
            started.elapsed(), ctx.posts.len(), ctx.pages.len(), ctx.lists.len(), ctx.item_errors
        );
        Ok(Self::report(&ctx, BuildOutcome::Complete))
    }

    fn report(ctx: &SiteContext, outcome: BuildOutcome) -> BuildReport {
        BuildReport {
            outcome,
            item_errors: ctx.item_errors,
            posts: ctx.posts.len(),
            pages: ctx.pages.len(),
            lists: ctx.lists.len(),
        }
    }

    // ------------------------------------------------------------------------
    // Render stage
    // ------------------------------------------------------------------------

    async fn render_all(
        &self,
        ctx: &mut SiteContext,
        output: &dyn Storage,
        cancel: &CancellationToken,
    ) -> anyhow::Result<Flow> {
        for group in [Group::Posts, Group::Pages, Group::Lists] {
            if self.render_group(ctx, group, output, cancel).await? == Flow::Cancelled {
                return Ok(Flow::Cancelled);
            }
        }
        Ok(Flow::Continue)
    }

    async fn render_group(
        &self,
        ctx: &mut SiteContext,
        group: Group,
        output: &dyn Storage,
        cancel: &CancellationToken,
    ) -> anyhow::Result<Flow> {
        for index in 0..group.items(ctx).len() {
            if cancel.is_cancelled() {
                return Ok(Flow::Cancelled);
            }

            let (url, dest, layout, model) = {
                let item = &group.items(ctx)[index];
                (
                    item.url.clone(),
                    item.dest.clone(),
                    resolve_layout(item),
                    render_model(item, ctx),
                )
            };

            let html = match self.renderer.render(&layout, &model).await {
                Ok(html) => html,
                Err(e) => {
                    log!("error"; "rendering `{url}` with `{layout}`: {e}");
                    ctx.record_error();
                    continue;
                }
            };
            if let Err(e) = output.write_text(&dest, &html).await {
                log!("error"; "writing `{dest}`: {e}");
                ctx.record_error();
            }
        }
        Ok(Flow::Continue)
    }

    // ------------------------------------------------------------------------
    // Asset stage
    // ------------------------------------------------------------------------

    async fn compile_styles(
        &self,
        ctx: &mut SiteContext,
        source: &dyn Storage,
        output: &dyn Storage,
    ) -> anyhow::Result<Flow> {
        let styles_dir = ctx.config.build.styles.clone();
        let entry_name = ctx.config.build.style_entry.clone();
        let entry = combine(&[&styles_dir, &entry_name]);

        if !source.exists(&entry).await.unwrap_or(false) {
            return Ok(Flow::Continue);
        }

        let style = if self.minify {
            OutputStyle::Compressed
        } else {
            OutputStyle::Expanded
        };

        let raw = match source.read_text(&entry).await {
            Ok(raw) => raw,
            Err(e) => {
                log!("error"; "reading stylesheet `{entry}`: {e}");
                ctx.record_error();
                return Ok(Flow::Continue);
            }
        };
        match self.compiler.compile(&raw, &entry, source, style).await {
            Ok(css) => {
                let dest = combine(&["css", &entry_name]);
                if let Err(e) = output.write_text(&dest, &css).await {
                    log!("error"; "writing `{dest}`: {e}");
                    ctx.record_error();
                }
            }
            Err(e) => {
                log!("error"; "compiling `{entry}`: {e}");
                ctx.record_error();
            }
        }
        Ok(Flow::Continue)
    }

    async fn copy_static(
        ctx: &mut SiteContext,
        source: &dyn Storage,
        output: &dyn Storage,
        cancel: &CancellationToken,
    ) -> anyhow::Result<Flow> {
        let static_dir = ctx.config.build.static_dir.clone();
        let files = source
            .list_files(&static_dir, "*", true)
            .await
            .with_context(|| format!("listing static files under `{static_dir}`"))?;

        for path in files {
            if cancel.is_cancelled() {
                return Ok(Flow::Cancelled);
            }
            let dest = path
                .strip_prefix(static_dir.as_str())
                .map(|r| r.trim_start_matches('/'))
                .unwrap_or(&path)
                .to_string();
            let result = async {
                let bytes = source.read_bytes(&path).await?;
                output.write_bytes(&dest, &bytes).await
            }
            .await;
            if let Err(e) = result {
                log!("error"; "copying `{path}`: {e}");
                ctx.record_error();
            }
        }
        Ok(Flow::Continue)
    }
}

impl Default for SiteBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The three renderable item groups, in render order.
#[derive(Clone, Copy)]
enum Group {
    Posts,
    Pages,
    Lists,
}

impl Group {
    fn items<'a>(&self, ctx: &'a SiteContext) -> &'a [crate::site::ContentItem] {
        match self {
            Group::Posts => &ctx.posts,
            Group::Pages => &ctx.pages,
            Group::Lists => &ctx.lists,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use async_trait::async_trait;

    const POST_TEMPLATE: &str =
        "<h1>{{ page.title }}</h1>{{ page.content | safe }}\
         {% if previous %}<a rel=\"prev\" href=\"{{ previous.url }}\">{{ previous.title }}</a>{% endif %}";
    const PAGE_TEMPLATE: &str = "<article>{{ page.content | safe }}</article>";
    const LIST_TEMPLATE: &str =
        "<ul>{% for post in posts %}<li>{{ post.title }}</li>{% endfor %}</ul>\
         <span>{{ pager.current_page }}/{{ pager.total_pages }}</span>";

    async fn seed_site(storage: &MemoryStorage) {
        storage.write_text("vellum.json", "{}").await.unwrap();
        storage
            .write_text("templates/post.html", POST_TEMPLATE)
            .await
            .unwrap();
        storage
            .write_text("templates/page.html", PAGE_TEMPLATE)
            .await
            .unwrap();
        storage
            .write_text("templates/list.html", LIST_TEMPLATE)
            .await
            .unwrap();
        storage
            .write_text(
                "content/posts/first.md",
                "---\ntitle: First Post\ndate: 2024-01-10\ntags: [rust]\n---\nHello **world**.",
            )
            .await
            .unwrap();
        storage
            .write_text(
                "content/posts/second.md",
                "---\ntitle: Second Post\ndate: 2024-02-20\ntags: [rust, web]\n---\nMore text.",
            )
            .await
            .unwrap();
        storage
            .write_text("content/index.md", "---\ntitle: Home\n---\nWelcome.")
            .await
            .unwrap();
        storage
            .write_text("content/about.md", "---\ntitle: About\n---\nAbout text.")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_full_build() {
        let source = MemoryStorage::new();
        let output = MemoryStorage::new();
        seed_site(&source).await;

        let report = SiteBuilder::new()
            .build("vellum.json", &source, &output, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.outcome, BuildOutcome::Complete);
        assert_eq!(report.item_errors, 0);
        assert_eq!(report.posts, 2);
        assert_eq!(report.pages, 2);

        let post = output
            .read_text("2024/02/20/second-post/index.html")
            .await
            .unwrap();
        assert!(post.contains("<h1>Second Post</h1>"));
        assert!(post.contains("First Post")); // previous link

        let home = output.read_text("index.html").await.unwrap();
        assert!(home.contains("Welcome."));

        let archive = output.read_text("blog/index.html").await.unwrap();
        assert!(archive.contains("Second Post"));
        assert!(archive.contains("First Post"));
        assert!(archive.contains("1/1"));

        let tag = output.read_text("tags/web/index.html").await.unwrap();
        assert!(tag.contains("Second Post"));
        assert!(!tag.contains("First Post"));
    }

    #[tokio::test]
    async fn test_missing_template_is_per_item() {
        let source = MemoryStorage::new();
        let output = MemoryStorage::new();
        seed_site(&source).await;
        source
            .write_text(
                "content/special.md",
                "---\ntitle: Special\nlayout: missing\n---\nX",
            )
            .await
            .unwrap();

        let report = SiteBuilder::new()
            .build("vellum.json", &source, &output, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.outcome, BuildOutcome::Complete);
        assert_eq!(report.item_errors, 1);
        // everything else still renders
        assert!(output.exists("about/index.html").await.unwrap());
    }

    #[tokio::test]
    async fn test_page_at_archive_url_not_overwritten() {
        let source = MemoryStorage::new();
        let output = MemoryStorage::new();
        seed_site(&source).await;
        source
            .write_text("content/blog.md", "---\ntitle: Blog\n---\nHand-written blog page.")
            .await
            .unwrap();

        let report = SiteBuilder::new()
            .build("vellum.json", &source, &output, &CancellationToken::new())
            .await
            .unwrap();

        // the archive wants /blog/ too; the discovered page keeps it and
        // the collision is reported
        assert_eq!(report.item_errors, 1);
        let html = output.read_text("blog/index.html").await.unwrap();
        assert!(html.contains("Hand-written blog page."));
        // tag pages are unaffected
        assert!(output.exists("tags/rust/index.html").await.unwrap());
    }

    #[tokio::test]
    async fn test_static_and_styles() {
        let source = MemoryStorage::new();
        let output = MemoryStorage::new();
        seed_site(&source).await;
        source
            .write_bytes("static/img/logo.png", &[0x89, 0x50])
            .await
            .unwrap();
        source.write_text("static/robots.txt", "User-agent: *").await.unwrap();
        source
            .write_text("styles/main.css", "@import \"base\";\nh1 { color: red; }")
            .await
            .unwrap();
        source
            .write_text("styles/base.css", "body { margin: 0; }")
            .await
            .unwrap();

        let report = SiteBuilder::new()
            .build("vellum.json", &source, &output, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(report.item_errors, 0);

        assert_eq!(
            output.read_bytes("img/logo.png").await.unwrap(),
            vec![0x89, 0x50]
        );
        assert_eq!(
            output.read_text("robots.txt").await.unwrap(),
            "User-agent: *"
        );
        let css = output.read_text("css/main.css").await.unwrap();
        assert!(css.contains("margin: 0"));
        assert!(css.contains("color: red"));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let source = MemoryStorage::new();
        let output = MemoryStorage::new();
        seed_site(&source).await;

        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = SiteBuilder::new()
            .build("vellum.json", &source, &output, &cancel)
            .await
            .unwrap();

        assert_eq!(report.outcome, BuildOutcome::Cancelled);
        assert!(!output.exists("index.html").await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_config_is_fatal() {
        let source = MemoryStorage::new();
        let output = MemoryStorage::new();
        source.write_text("vellum.json", "{ nope").await.unwrap();

        let result = SiteBuilder::new()
            .build("vellum.json", &source, &output, &CancellationToken::new())
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_drafts_override() {
        let source = MemoryStorage::new();
        let output = MemoryStorage::new();
        seed_site(&source).await;
        source
            .write_text(
                "content/posts/wip.md",
                "---\ntitle: WIP\ndate: 2024-03-01\ndraft: true\n---\nDraft body",
            )
            .await
            .unwrap();

        let mut builder = SiteBuilder::new();
        builder.set_overrides(ConfigOverrides {
            drafts: Some(true),
            future: None,
        });
        let report = builder
            .build("vellum.json", &source, &output, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.posts, 3);
        assert!(output
            .exists("drafts/2024/03/01/wip/index.html")
            .await
            .unwrap());
    }

    struct MarkerPlugin;

    #[async_trait]
    impl Plugin for MarkerPlugin {
        fn name(&self) -> &str {
            "marker"
        }

        fn stages(&self) -> &[PipelineStage] {
            &[PipelineStage::PostBuild]
        }

        async fn execute(
            &self,
            _stage: PipelineStage,
            ctx: &mut SiteContext,
            _source: &dyn Storage,
            output: &dyn Storage,
            _cancel: &CancellationToken,
        ) -> anyhow::Result<()> {
            output
                .write_text("marker.txt", &format!("posts={}", ctx.posts.len()))
                .await?;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_plugin_checkpoint_runs() {
        let source = MemoryStorage::new();
        let output = MemoryStorage::new();
        seed_site(&source).await;

        let mut builder = SiteBuilder::new();
        builder.register_plugin(Arc::new(MarkerPlugin));
        let report = builder
            .build("vellum.json", &source, &output, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.outcome, BuildOutcome::Complete);
        assert_eq!(output.read_text("marker.txt").await.unwrap(), "posts=2");
    }
}
