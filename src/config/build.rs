//! `build` section configuration.
//!
//! Directory roles, content classification, pagination size, draft and
//! future-date policy, and the nested feed/sitemap toggles.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `build` section in vellum.json.
///
/// All directory fields are `/`-separated paths relative to the source
/// storage root; `output` is only used by the CLI to root the output
/// storage.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Content tree root.
    #[serde(default = "defaults::build::content")]
    #[educe(Default = defaults::build::content())]
    pub content: String,

    /// Template directory, loaded once at renderer initialization.
    #[serde(default = "defaults::build::templates")]
    #[educe(Default = defaults::build::templates())]
    pub templates: String,

    /// Shared template includes, registered under `includes/`.
    #[serde(default = "defaults::build::includes")]
    #[educe(Default = defaults::build::includes())]
    pub includes: String,

    /// Files copied verbatim to the output root.
    #[serde(rename = "static", default = "defaults::build::static_dir")]
    #[educe(Default = defaults::build::static_dir())]
    pub static_dir: String,

    /// Stylesheet sources compiled through the asset compiler.
    #[serde(default = "defaults::build::styles")]
    #[educe(Default = defaults::build::styles())]
    pub styles: String,

    /// Entry stylesheet inside the styles directory.
    #[serde(default = "defaults::build::style_entry")]
    #[educe(Default = defaults::build::style_entry())]
    pub style_entry: String,

    /// Output directory name (CLI-level concern).
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: String,

    /// Subdirectory of the content root whose files classify as posts.
    #[serde(default = "defaults::build::posts_dir")]
    #[educe(Default = defaults::build::posts_dir())]
    pub posts_dir: String,

    /// Page size for archive and taxonomy pagination; 0 means unlimited.
    #[serde(default = "defaults::build::posts_per_page")]
    #[educe(Default = defaults::build::posts_per_page())]
    pub posts_per_page: usize,

    /// Build items flagged `draft: true`.
    #[serde(default = "defaults::r#false")]
    pub drafts: bool,

    /// URL and destination prefix for drafts built under relaxed rules.
    #[serde(default = "defaults::build::drafts_base")]
    #[educe(Default = defaults::build::drafts_base())]
    pub drafts_base: String,

    /// Build items dated in the future.
    #[serde(default = "defaults::r#false")]
    pub future: bool,

    /// Feed generation settings.
    #[serde(default)]
    pub feed: FeedConfig,

    /// Sitemap generation settings.
    #[serde(default)]
    pub sitemap: SitemapConfig,
}

/// `build.feed` subsection.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct FeedConfig {
    #[serde(default = "defaults::r#false")]
    pub enable: bool,

    /// Output path of the feed, relative to the output root.
    #[serde(default = "defaults::build::feed::path")]
    #[educe(Default = defaults::build::feed::path())]
    pub path: String,

    /// Maximum number of posts in the feed.
    #[serde(default = "defaults::build::feed::limit")]
    #[educe(Default = defaults::build::feed::limit())]
    pub limit: usize,
}

/// `build.sitemap` subsection.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SitemapConfig {
    #[serde(default = "defaults::r#false")]
    pub enable: bool,

    /// Output path of the sitemap, relative to the output root.
    #[serde(default = "defaults::build::sitemap::path")]
    #[educe(Default = defaults::build::sitemap::path())]
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;

    #[test]
    fn test_build_config_defaults() {
        let config: SiteConfig = serde_json::from_str("{}").unwrap();

        assert_eq!(config.build.content, "content");
        assert_eq!(config.build.templates, "templates");
        assert_eq!(config.build.includes, "includes");
        assert_eq!(config.build.static_dir, "static");
        assert_eq!(config.build.styles, "styles");
        assert_eq!(config.build.output, "public");
        assert_eq!(config.build.posts_dir, "posts");
        assert_eq!(config.build.posts_per_page, 10);
        assert!(!config.build.drafts);
        assert!(!config.build.future);
        assert_eq!(config.build.drafts_base, "drafts");
    }

    #[test]
    fn test_build_config_overrides() {
        let config = r#"{
            "build": {
                "content": "src",
                "static": "files",
                "posts_per_page": 5,
                "drafts": true
            }
        }"#;
        let config: SiteConfig = serde_json::from_str(config).unwrap();

        assert_eq!(config.build.content, "src");
        assert_eq!(config.build.static_dir, "files");
        assert_eq!(config.build.posts_per_page, 5);
        assert!(config.build.drafts);
    }

    #[test]
    fn test_feed_config_defaults() {
        let config: SiteConfig = serde_json::from_str("{}").unwrap();

        assert!(!config.build.feed.enable);
        assert_eq!(config.build.feed.path, "feed.xml");
        assert_eq!(config.build.feed.limit, 20);
        assert!(!config.build.sitemap.enable);
        assert_eq!(config.build.sitemap.path, "sitemap.xml");
    }

    #[test]
    fn test_feed_config_enable() {
        let config = r#"{
            "build": { "feed": { "enable": true, "path": "atom.xml" } }
        }"#;
        let config: SiteConfig = serde_json::from_str(config).unwrap();

        assert!(config.build.feed.enable);
        assert_eq!(config.build.feed.path, "atom.xml");
    }

    #[test]
    fn test_posts_per_page_zero_is_unlimited() {
        let config = r#"{ "build": { "posts_per_page": 0 } }"#;
        let config: SiteConfig = serde_json::from_str(config).unwrap();
        assert_eq!(config.build.posts_per_page, 0);
    }
}
