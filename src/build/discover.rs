//! Content discovery: walk the content tree, parse, classify, resolve
//! URLs.
//!
//! Failures on individual files are logged and counted; only a failing
//! directory listing aborts the build.

use super::Flow;
use crate::content::ParserRegistry;
use crate::log;
use crate::permalink::{resolve, PermalinkInput};
use crate::site::{ContentItem, ItemKind, PostData, SiteContext};
use crate::storage::Storage;
use anyhow::Context;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tokio_util::sync::CancellationToken;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Reading speed for the reading-time estimate, in words per minute
const WORDS_PER_MINUTE: usize = 200;

/// Maximum length of a derived summary, in characters
const SUMMARY_LENGTH: usize = 200;

pub(crate) async fn discover(
    ctx: &mut SiteContext,
    parsers: &ParserRegistry,
    source: &dyn Storage,
    cancel: &CancellationToken,
) -> anyhow::Result<Flow> {
    let config = ctx.config.clone();
    let content_root = &config.build.content;
    let posts_prefix = format!("{}/", config.build.posts_dir);
    let now = chrono::Utc::now().naive_utc();

    let files = source
        .list_files(content_root, "*", true)
        .await
        .with_context(|| format!("listing content under `{content_root}`"))?;

    let mut seen_urls: HashSet<String> = HashSet::new();

    for path in files {
        if cancel.is_cancelled() {
            return Ok(Flow::Cancelled);
        }

        let Some(parser) = parsers.for_path(&path) else {
            continue;
        };
        let rel = path
            .strip_prefix(content_root)
            .map(|r| r.trim_start_matches('/'))
            .unwrap_or(&path)
            .to_string();

        let raw = match source.read_text(&path).await {
            Ok(raw) => raw,
            Err(e) => {
                log!("error"; "failed to read `{path}`: {e}");
                ctx.record_error();
                continue;
            }
        };
        let parsed = match parser.parse(&raw, &rel) {
            Ok(parsed) => parsed,
            Err(e) => {
                log!("error"; "failed to parse `{path}`: {e}");
                ctx.record_error();
                continue;
            }
        };

        if parsed.meta.draft && !config.build.drafts {
            log!("discover"; "skipping draft `{rel}`");
            continue;
        }

        if let Some(date) = parsed.meta.date {
            if date > now && !config.build.future {
                log!("discover"; "skipping future-dated `{rel}`");
                continue;
            }
        }

        let is_post = rel.starts_with(&posts_prefix);

        if is_post && parsed.meta.date.is_none() {
            log!("error"; "post `{rel}` has no date, skipping");
            ctx.record_error();
            continue;
        }

        let template = if is_post {
            &config.permalinks.posts
        } else {
            &config.permalinks.pages
        };
        let draft_prefix = (parsed.meta.draft && config.build.drafts)
            .then_some(config.build.drafts_base.as_str());
        let resolved = resolve(&PermalinkInput {
            rel_source: &rel,
            meta: &parsed.meta,
            template,
            date: parsed.meta.date,
            draft_prefix,
        });

        if !seen_urls.insert(resolved.url.clone()) {
            log!("error"; "URL collision at `{}` from `{rel}`, skipping", resolved.url);
            ctx.record_error();
            continue;
        }

        let seo = ctx.seo_for(
            parsed.meta.title.as_deref(),
            parsed.meta.summary.as_deref(),
            &resolved.url,
        );

        let kind = if is_post {
            let plain = TAG_RE.replace_all(&parsed.body, " ");
            ItemKind::Post(PostData {
                // checked above
                date: parsed.meta.date.unwrap_or(now),
                reading_time: reading_time(&plain),
                summary: parsed
                    .meta
                    .summary
                    .clone()
                    .unwrap_or_else(|| derive_summary(&plain)),
                previous: None,
                next: None,
            })
        } else {
            ItemKind::Page
        };

        let item = ContentItem {
            source: rel,
            dest: resolved.dest,
            url: resolved.url,
            meta: parsed.meta,
            body: parsed.body,
            seo: Some(seo),
            kind,
        };
        match item.kind {
            ItemKind::Post(_) => ctx.posts.push(item),
            _ => ctx.pages.push(item),
        }
    }

    log!("discover"; "{} posts, {} pages", ctx.posts.len(), ctx.pages.len());
    Ok(Flow::Continue)
}

/// Estimated reading time in minutes over tag-stripped text.
fn reading_time(plain: &str) -> u32 {
    let words = plain.split_whitespace().count();
    (words.div_ceil(WORDS_PER_MINUTE)).max(1) as u32
}

/// First ~200 characters of tag-stripped text, whitespace-collapsed.
fn derive_summary(plain: &str) -> String {
    let collapsed: Vec<&str> = plain.split_whitespace().collect();
    let text = collapsed.join(" ");
    if text.chars().count() <= SUMMARY_LENGTH {
        return text;
    }
    let mut summary: String = text.chars().take(SUMMARY_LENGTH).collect();
    // cut back to the last full word
    if let Some(idx) = summary.rfind(' ') {
        summary.truncate(idx);
    }
    summary.push('…');
    summary
}
