//! The build-time data model.
//!
//! A build owns exactly one [`SiteContext`]: configuration plus every
//! discovered or generated [`ContentItem`] and the aggregated taxonomy
//! map. The context is created after configuration load, mutated by each
//! pipeline stage (and by plugins between stages), and discarded when the
//! build ends.
//!
//! Content items are a tagged union: one struct of common fields plus an
//! [`ItemKind`] payload for the post/page/list split. Cross-item links
//! (previous/next, taxonomy membership, list membership) are indices into
//! `SiteContext::posts`, valid only for the lifetime of the context.

use crate::config::SiteConfig;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ============================================================================
// Metadata (frontmatter)
// ============================================================================

/// Parsed frontmatter for one content file.
///
/// Recognized keys are typed; everything else lands in `extra` and is
/// passed through to templates and plugins untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub title: Option<String>,
    #[serde(with = "flexible_datetime")]
    pub date: Option<NaiveDateTime>,
    #[serde(with = "flexible_datetime", alias = "last_modified")]
    pub lastmod: Option<NaiveDateTime>,
    pub layout: Option<String>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub draft: bool,
    pub url: Option<String>,
    pub slug: Option<String>,
    pub summary: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Serde adapter accepting `YYYY-MM-DD` and `YYYY-MM-DDTHH:MM:SS[Z]`.
pub mod flexible_datetime {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_str(&dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) => parse_datetime(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date: `{s}`"))),
        }
    }
}

/// Parse `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS` or the same with a trailing
/// `Z`. Returns `None` for anything else.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN));
    }
    let s = s.strip_suffix('Z').unwrap_or(s);
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").ok()
}

// ============================================================================
// Content items
// ============================================================================

/// One renderable unit of the site: a post, a page, or a generated list.
#[derive(Debug, Clone)]
pub struct ContentItem {
    /// Source path relative to the content root; empty for generated items
    pub source: String,
    /// Output path relative to the output root, no leading slash
    pub dest: String,
    /// Site-absolute URL, starting with `/`
    pub url: String,
    /// Frontmatter (synthesized for generated items)
    pub meta: Metadata,
    /// Rendered body HTML; empty for generated items
    pub body: String,
    /// Computed SEO payload
    pub seo: Option<Seo>,
    /// Variant payload
    pub kind: ItemKind,
}

/// Variant payload for [`ContentItem`].
#[derive(Debug, Clone)]
pub enum ItemKind {
    Post(PostData),
    Page,
    List(ListData),
}

/// Post-specific fields.
#[derive(Debug, Clone)]
pub struct PostData {
    /// Publish date; required, enforced at discovery
    pub date: NaiveDateTime,
    /// Estimated reading time in minutes, at 200 words per minute
    pub reading_time: u32,
    /// Explicit or derived summary text
    pub summary: String,
    /// Index of the next-older post in the sorted posts list
    pub previous: Option<usize>,
    /// Index of the next-newer post in the sorted posts list
    pub next: Option<usize>,
}

/// Fields for one generated archive or taxonomy page.
#[derive(Debug, Clone)]
pub struct ListData {
    /// Taxonomy this list belongs to, `None` for the main feed
    pub taxonomy: Option<String>,
    /// Term display name, `None` for the main feed
    pub term: Option<String>,
    /// Indices into `SiteContext::posts` for this page's slice
    pub posts: Vec<usize>,
    pub pager: Pager,
}

/// Navigation data for one page of a sliced list.
#[derive(Debug, Clone, Serialize)]
pub struct Pager {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    /// Upper bound on items per page; an unlimited list reports its
    /// item count here, never zero
    pub page_size: usize,
    pub previous_url: Option<String>,
    pub next_url: Option<String>,
    pub first_url: String,
    pub page_url_template: String,
}

/// Computed SEO payload attached to every item.
#[derive(Debug, Clone, Serialize)]
pub struct Seo {
    pub title: String,
    pub description: Option<String>,
    pub canonical: Option<String>,
}

impl ContentItem {
    pub fn is_post(&self) -> bool {
        matches!(self.kind, ItemKind::Post(_))
    }

    pub fn post(&self) -> Option<&PostData> {
        match &self.kind {
            ItemKind::Post(data) => Some(data),
            _ => None,
        }
    }

    pub fn list(&self) -> Option<&ListData> {
        match &self.kind {
            ItemKind::List(data) => Some(data),
            _ => None,
        }
    }

    /// Publish date for posts, frontmatter date otherwise.
    pub fn date(&self) -> Option<NaiveDateTime> {
        match &self.kind {
            ItemKind::Post(data) => Some(data.date),
            _ => self.meta.date,
        }
    }
}

// ============================================================================
// Taxonomies
// ============================================================================

/// One taxonomy term with its member posts.
///
/// Keys in the taxonomy map are case-folded; `name` keeps the casing of
/// the first occurrence for display.
#[derive(Debug, Clone)]
pub struct TermEntry {
    pub name: String,
    pub posts: Vec<usize>,
}

/// taxonomy name → case-folded term → entry
pub type TaxonomyMap = BTreeMap<String, BTreeMap<String, TermEntry>>;

// ============================================================================
// Site context
// ============================================================================

/// The single mutable aggregate for one build.
///
/// Passed by exclusive reference through the pipeline; plugins receive the
/// same exclusive reference strictly between stages, never interleaved
/// with orchestrator mutation. No locking: the whole pipeline is one
/// logical thread.
#[derive(Debug)]
pub struct SiteContext {
    pub config: SiteConfig,
    pub posts: Vec<ContentItem>,
    pub pages: Vec<ContentItem>,
    /// Generated archive and taxonomy pages
    pub lists: Vec<ContentItem>,
    pub taxonomies: TaxonomyMap,
    /// Count of per-item failures logged during this build
    pub item_errors: usize,
}

impl SiteContext {
    pub fn new(config: SiteConfig) -> Self {
        Self {
            config,
            posts: Vec::new(),
            pages: Vec::new(),
            lists: Vec::new(),
            taxonomies: TaxonomyMap::new(),
            item_errors: 0,
        }
    }

    /// Record one per-item failure. The caller logs the details.
    pub fn record_error(&mut self) {
        self.item_errors += 1;
    }

    /// Prefix a site-absolute path with the configured base URL.
    pub fn absolute_url(&self, path: &str) -> String {
        match self.config.base.url.as_deref() {
            Some(base) => format!("{}{}", base.trim_end_matches('/'), path),
            None => path.to_string(),
        }
    }

    /// Compute the SEO payload for an item with the given title/summary.
    pub fn seo_for(&self, title: Option<&str>, description: Option<&str>, url: &str) -> Seo {
        Seo {
            title: title.unwrap_or(&self.config.base.title).to_string(),
            description: description
                .map(str::to_string)
                .or_else(|| Some(self.config.base.description.clone()).filter(|d| !d.is_empty())),
            canonical: self
                .config
                .base
                .url
                .as_deref()
                .map(|base| format!("{}{}", base.trim_end_matches('/'), url)),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_datetime_date_only() {
        let dt = parse_datetime("2024-01-15").unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-01-15 00:00:00");
    }

    #[test]
    fn test_parse_datetime_with_time() {
        let dt = parse_datetime("2024-01-15T08:30:00").unwrap();
        assert_eq!(dt.format("%H:%M").to_string(), "08:30");
    }

    #[test]
    fn test_parse_datetime_utc_suffix() {
        assert!(parse_datetime("2024-01-15T08:30:00Z").is_some());
    }

    #[test]
    fn test_parse_datetime_invalid() {
        assert!(parse_datetime("January 15, 2024").is_none());
        assert!(parse_datetime("2024-13-01").is_none());
        assert!(parse_datetime("").is_none());
    }

    #[test]
    fn test_metadata_from_yaml() {
        let meta: Metadata = serde_yaml::from_str(
            r#"
title: Hello
date: 2024-01-15
tags: [rust, ssg]
draft: true
custom_key: custom value
"#,
        )
        .unwrap();

        assert_eq!(meta.title.as_deref(), Some("Hello"));
        assert!(meta.date.is_some());
        assert_eq!(meta.tags, vec!["rust", "ssg"]);
        assert!(meta.draft);
        assert_eq!(
            meta.extra.get("custom_key").and_then(|v| v.as_str()),
            Some("custom value")
        );
    }

    #[test]
    fn test_metadata_defaults() {
        let meta: Metadata = serde_yaml::from_str("title: Only Title").unwrap();
        assert!(!meta.draft);
        assert!(meta.date.is_none());
        assert!(meta.tags.is_empty());
        assert!(meta.extra.is_empty());
    }

    #[test]
    fn test_metadata_invalid_date_is_error() {
        let result: Result<Metadata, _> = serde_yaml::from_str("date: not-a-date");
        assert!(result.is_err());
    }

    #[test]
    fn test_absolute_url() {
        let mut config = SiteConfig::default();
        config.base.url = Some("https://example.com/".to_string());
        let ctx = SiteContext::new(config);
        assert_eq!(ctx.absolute_url("/posts/a/"), "https://example.com/posts/a/");
    }

    #[test]
    fn test_absolute_url_without_base() {
        let ctx = SiteContext::new(SiteConfig::default());
        assert_eq!(ctx.absolute_url("/posts/a/"), "/posts/a/");
    }

    #[test]
    fn test_seo_for_falls_back_to_site_title() {
        let mut config = SiteConfig::default();
        config.base.title = "My Site".to_string();
        config.base.url = Some("https://example.com".to_string());
        let ctx = SiteContext::new(config);

        let seo = ctx.seo_for(None, None, "/about/");
        assert_eq!(seo.title, "My Site");
        assert_eq!(seo.canonical.as_deref(), Some("https://example.com/about/"));
    }

    #[test]
    fn test_record_error() {
        let mut ctx = SiteContext::new(SiteConfig::default());
        ctx.record_error();
        ctx.record_error();
        assert_eq!(ctx.item_errors, 2);
    }
}
