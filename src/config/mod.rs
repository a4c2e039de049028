//! Site configuration management for `vellum.json`.
//!
//! # Sections
//!
//! | Section       | Purpose                                            |
//! |---------------|----------------------------------------------------|
//! | `base`        | Site metadata (title, author, url, language)       |
//! | `build`       | Directory roles, pagination, drafts, feed, sitemap |
//! | `permalinks`  | URL templates for posts, pages and the archive     |
//! | `taxonomies`  | Taxonomy name → URL base path                      |
//! | `extra`       | User-defined custom fields                         |
//!
//! # Example
//!
//! ```json
//! {
//!   "base": {
//!     "title": "My Blog",
//!     "description": "A personal blog",
//!     "url": "https://example.com"
//!   },
//!   "build": {
//!     "posts_per_page": 10,
//!     "feed": { "enable": true }
//!   },
//!   "permalinks": { "posts": "/:year/:month/:day/:slug/" },
//!   "extra": { "analytics_id": "UA-12345" }
//! }
//! ```
//!
//! Load policy: a missing config file falls back to defaults (logged); a
//! present but unparseable file is a fatal error.

mod base;
mod build;
pub mod defaults;
mod error;

pub use base::BaseConfig;
pub use build::{BuildConfig, FeedConfig, SitemapConfig};
pub use error::ConfigError;

use crate::log;
use crate::storage::Storage;
use educe::Educe;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing vellum.json.
///
/// Immutable after load: the orchestrator reads it, applies CLI overrides
/// once, then only hands out shared references.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Basic site information
    pub base: BaseConfig,

    /// Build settings
    pub build: BuildConfig,

    /// Permalink templates
    pub permalinks: PermalinkConfig,

    /// Taxonomy name → URL base path
    #[serde(default = "defaults::taxonomies")]
    #[educe(Default = defaults::taxonomies())]
    pub taxonomies: BTreeMap<String, String>,

    /// User-defined extra fields
    pub extra: BTreeMap<String, Value>,
}

/// `permalinks` section: URL templates with `:slug`, `:year`, `:month`,
/// `:day` placeholders.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct PermalinkConfig {
    #[serde(default = "defaults::permalinks::posts")]
    #[educe(Default = defaults::permalinks::posts())]
    pub posts: String,

    #[serde(default = "defaults::permalinks::pages")]
    #[educe(Default = defaults::permalinks::pages())]
    pub pages: String,

    /// Base URL of the paginated archive of all posts.
    #[serde(default = "defaults::permalinks::archive")]
    #[educe(Default = defaults::permalinks::archive())]
    pub archive: String,
}

/// CLI-provided overrides folded into the loaded configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigOverrides {
    pub drafts: Option<bool>,
    pub future: Option<bool>,
}

impl SiteConfig {
    /// Parse configuration from a JSON string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: SiteConfig = serde_json::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from storage.
    ///
    /// A missing file yields the default configuration; a file that fails
    /// to read or parse is an error.
    pub async fn load(storage: &dyn Storage, path: &str) -> Result<Self, ConfigError> {
        if !storage
            .exists(path)
            .await
            .map_err(|e| ConfigError::Storage(path.to_string(), e))?
        {
            log!("config"; "`{path}` not found, using defaults");
            return Ok(Self::default());
        }

        let content = storage
            .read_text(path)
            .await
            .map_err(|e| ConfigError::Storage(path.to_string(), e))?;
        Self::from_str(&content)
    }

    /// Fold CLI overrides into the loaded configuration.
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        Self::update_option(&mut self.build.drafts, overrides.drafts);
        Self::update_option(&mut self.build.future, overrides.future);
    }

    /// Update config option if CLI value is provided
    fn update_option<T>(config_option: &mut T, cli_option: Option<T>) {
        if let Some(option) = cli_option {
            *config_option = option;
        }
    }

    /// Validate configuration consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.base.url {
            if !url.starts_with("http") {
                return Err(ConfigError::Validation(
                    "`base.url` must start with http:// or https://".into(),
                ));
            }
        }

        if self.build.feed.enable && self.base.url.is_none() {
            return Err(ConfigError::Validation(
                "`base.url` is required for feed generation".into(),
            ));
        }

        if self.build.sitemap.enable && self.base.url.is_none() {
            return Err(ConfigError::Validation(
                "`base.url` is required for sitemap generation".into(),
            ));
        }

        for template in [&self.permalinks.posts, &self.permalinks.pages] {
            if !template.starts_with('/') {
                return Err(ConfigError::Validation(format!(
                    "permalink template `{template}` must start with `/`"
                )));
            }
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
