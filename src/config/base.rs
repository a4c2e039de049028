//! `base` section configuration.
//!
//! Contains basic site information like title, author, description, etc.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `base` section in vellum.json - basic site metadata.
///
/// # Example
/// ```json
/// {
///   "base": {
///     "title": "My Blog",
///     "description": "A personal blog about Rust",
///     "author": "Alice",
///     "url": "https://myblog.com"
///   }
/// }
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BaseConfig {
    /// Site title displayed in browser tab and headers.
    #[serde(default)]
    pub title: String,

    /// Site description for SEO meta tags and the feed channel.
    #[serde(default)]
    pub description: String,

    /// Author name for feed items and meta tags.
    #[serde(default)]
    pub author: String,

    /// Author email for the feed.
    #[serde(default)]
    pub email: String,

    /// Base URL for absolute links in feed/sitemap.
    /// Required when `build.feed.enable` is true.
    #[serde(default = "defaults::base::url")]
    #[educe(Default = defaults::base::url())]
    pub url: Option<String>,

    /// BCP 47 language code (e.g., "en", "en-US").
    #[serde(default = "defaults::base::language")]
    #[educe(Default = defaults::base::language())]
    pub language: String,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;

    #[test]
    fn test_base_config_full() {
        let config = r#"{
            "base": {
                "title": "Alice",
                "description": "Alice's Blog",
                "url": "https://alice.example.com",
                "language": "en-US"
            }
        }"#;
        let config: SiteConfig = serde_json::from_str(config).unwrap();

        assert_eq!(config.base.title, "Alice");
        assert_eq!(config.base.description, "Alice's Blog");
        assert_eq!(config.base.url, Some("https://alice.example.com".to_string()));
        assert_eq!(config.base.language, "en-US");
    }

    #[test]
    fn test_base_config_defaults() {
        let config = r#"{ "base": { "title": "Test" } }"#;
        let config: SiteConfig = serde_json::from_str(config).unwrap();

        assert_eq!(config.base.title, "Test");
        assert_eq!(config.base.language, "en");
        assert_eq!(config.base.url, None);
        assert_eq!(config.base.author, "");
    }

    #[test]
    fn test_unknown_field_rejection() {
        let config = r#"{ "base": { "title": "Test", "unknown_field": 1 } }"#;
        let result: Result<SiteConfig, _> = serde_json::from_str(config);

        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn test_base_config_unicode() {
        let config = r#"{ "base": { "title": "My Blog 🚀", "author": "René" } }"#;
        let config: SiteConfig = serde_json::from_str(config).unwrap();

        assert_eq!(config.base.title, "My Blog 🚀");
        assert_eq!(config.base.author, "René");
    }
}
