//! Sitemap generation.
//!
//! Writes a sitemap.xml listing every built URL for search engine
//! indexing.
//!
//! # Sitemap Format
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/</loc>
//!     <lastmod>2025-01-01</lastmod>
//!   </url>
//! </urlset>
//! ```

use crate::log;
use crate::plugin::{PipelineStage, Plugin};
use crate::site::{ContentItem, SiteContext};
use crate::storage::Storage;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// XML namespace for sitemap
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Generates a sitemap of all posts, pages and lists at
/// `build.sitemap.path`.
pub struct SitemapPlugin;

/// Single URL entry in the sitemap
struct UrlEntry {
    loc: String,
    /// Last modification date, `YYYY-MM-DD`
    lastmod: Option<String>,
}

impl SitemapPlugin {
    fn entry_for(ctx: &SiteContext, item: &ContentItem) -> UrlEntry {
        let lastmod = item.meta.lastmod.or_else(|| item.date());
        UrlEntry {
            loc: ctx.absolute_url(&item.url),
            lastmod: lastmod.map(|d| d.format("%Y-%m-%d").to_string()),
        }
    }

    fn into_xml(urls: Vec<UrlEntry>) -> String {
        let mut xml = String::with_capacity(4096);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#));
        xml.push('\n');

        for entry in urls {
            xml.push_str("  <url>\n");
            xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&entry.loc)));
            if let Some(lastmod) = entry.lastmod {
                xml.push_str(&format!("    <lastmod>{lastmod}</lastmod>\n"));
            }
            xml.push_str("  </url>\n");
        }

        xml.push_str("</urlset>\n");
        xml
    }
}

#[async_trait]
impl Plugin for SitemapPlugin {
    fn name(&self) -> &str {
        "sitemap"
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
        let sitemap = &ctx.config.build.sitemap;
        if !sitemap.enable {
            return Ok(());
        }

        let urls: Vec<UrlEntry> = ctx
            .posts
            .iter()
            .chain(ctx.pages.iter())
            .chain(ctx.lists.iter())
            .map(|item| Self::entry_for(ctx, item))
            .collect();

        let count = urls.len();
        output
            .write_text(&sitemap.path, &Self::into_xml(urls))
            .await?;
        log!("sitemap"; "wrote `{}` with {count} urls", sitemap.path);
        Ok(())
    }
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
