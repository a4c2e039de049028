//! RSS 2.0 feed generation.

use crate::log;
use crate::plugin::{PipelineStage, Plugin};
use crate::site::SiteContext;
use crate::storage::Storage;
use async_trait::async_trait;
use rss::validation::Validate;
use rss::{ChannelBuilder, GuidBuilder, Item, ItemBuilder};
use tokio_util::sync::CancellationToken;

/// Generates an RSS 2.0 feed of the newest posts at `build.feed.path`.
pub struct FeedPlugin;

impl FeedPlugin {
    fn item_for(ctx: &SiteContext, post: &crate::site::ContentItem) -> Item {
        let link = ctx.absolute_url(&post.url);
        let mut builder = ItemBuilder::default();
        builder
            .title(post.meta.title.clone())
            .link(Some(link.clone()))
            .guid(GuidBuilder::default().permalink(true).value(link).build());

        if let Some(data) = post.post() {
            builder
                .pub_date(Some(data.date.and_utc().to_rfc2822()))
                .description(Some(data.summary.clone()));
        }
        if !ctx.config.base.email.is_empty() {
            builder.author(Some(format!(
                "{} ({})",
                ctx.config.base.email, ctx.config.base.author
            )));
        }
        builder.build()
    }
}

#[async_trait]
impl Plugin for FeedPlugin {
    fn name(&self) -> &str {
        "feed"
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
        let feed = &ctx.config.build.feed;
        if !feed.enable {
            return Ok(());
        }

        let items: Vec<Item> = ctx
            .posts
            .iter()
            .take(feed.limit)
            .map(|post| Self::item_for(ctx, post))
            .collect();

        let channel = ChannelBuilder::default()
            .title(ctx.config.base.title.clone())
            .link(ctx.absolute_url("/"))
            .description(ctx.config.base.description.clone())
            .language(Some(ctx.config.base.language.clone()))
            .last_build_date(ctx.posts.first().and_then(|p| p.post()).map(|d| {
                d.date.and_utc().to_rfc2822()
            }))
            .items(items)
            .build();
        channel.validate()?;

        output.write_text(&feed.path, &channel.to_string()).await?;
        log!("feed"; "wrote `{}` with {} items", feed.path, ctx.posts.len().min(feed.limit));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::site::{ContentItem, ItemKind, Metadata, PostData};
    use crate::storage::MemoryStorage;
    use chrono::NaiveDate;

    fn post(title: &str, url: &str, date: (i32, u32, u32)) -> ContentItem {
        ContentItem {
            source: String::new(),
            dest: String::new(),
            url: url.to_string(),
            meta: Metadata {
                title: Some(title.to_string()),
                ..Default::default()
            },
            body: String::new(),
            seo: None,
            kind: ItemKind::Post(PostData {
                date: NaiveDate::from_ymd_opt(date.0, date.1, date.2)
                    .unwrap()
                    .and_hms_opt(12, 0, 0)
                    .unwrap(),
                reading_time: 1,
                summary: format!("{title} summary"),
                previous: None,
                next: None,
            }),
        }
    }

    fn feed_context() -> SiteContext {
        let mut config = SiteConfig::default();
        config.base.title = "Feed Site".to_string();
        config.base.description = "A site".to_string();
        config.base.url = Some("https://example.com".to_string());
        config.build.feed.enable = true;
        let mut ctx = SiteContext::new(config);
        ctx.posts = vec![
            post("Newest", "/2024/02/01/newest/", (2024, 2, 1)),
            post("Oldest", "/2024/01/01/oldest/", (2024, 1, 1)),
        ];
        ctx
    }

    #[tokio::test]
    async fn test_feed_written() {
        let mut ctx = feed_context();
        let source = MemoryStorage::new();
        let output = MemoryStorage::new();

        FeedPlugin
            .execute(
                PipelineStage::PostBuild,
                &mut ctx,
                &source,
                &output,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let xml = output.read_text("feed.xml").await.unwrap();
        assert!(xml.contains("<title>Feed Site</title>"));
        assert!(xml.contains("https://example.com/2024/02/01/newest/"));
        assert!(xml.contains("Newest summary"));
        // newest post first
        assert!(xml.find("Newest").unwrap() < xml.find("Oldest").unwrap());
    }

    #[tokio::test]
    async fn test_feed_respects_limit() {
        let mut ctx = feed_context();
        ctx.config.build.feed.limit = 1;
        let source = MemoryStorage::new();
        let output = MemoryStorage::new();

        FeedPlugin
            .execute(
                PipelineStage::PostBuild,
                &mut ctx,
                &source,
                &output,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let xml = output.read_text("feed.xml").await.unwrap();
        assert!(xml.contains("Newest"));
        assert!(!xml.contains("Oldest"));
    }

    #[tokio::test]
    async fn test_feed_disabled_writes_nothing() {
        let mut ctx = feed_context();
        ctx.config.build.feed.enable = false;
        let source = MemoryStorage::new();
        let output = MemoryStorage::new();

        FeedPlugin
            .execute(
                PipelineStage::PostBuild,
                &mut ctx,
                &source,
                &output,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(!output.exists("feed.xml").await.unwrap());
    }
}
