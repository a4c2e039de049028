//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

use std::collections::BTreeMap;

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [base] Section Defaults
// ============================================================================

pub mod base {
    pub fn url() -> Option<String> {
        None
    }

    pub fn language() -> String {
        "en".into()
    }
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    pub fn content() -> String {
        "content".into()
    }

    pub fn templates() -> String {
        "templates".into()
    }

    pub fn includes() -> String {
        "includes".into()
    }

    pub fn static_dir() -> String {
        "static".into()
    }

    pub fn styles() -> String {
        "styles".into()
    }

    pub fn style_entry() -> String {
        "main.css".into()
    }

    pub fn output() -> String {
        "public".into()
    }

    pub fn posts_dir() -> String {
        "posts".into()
    }

    pub fn posts_per_page() -> usize {
        10
    }

    pub fn drafts_base() -> String {
        "drafts".into()
    }

    pub mod feed {
        pub fn path() -> String {
            "feed.xml".into()
        }

        pub fn limit() -> usize {
            20
        }
    }

    pub mod sitemap {
        pub fn path() -> String {
            "sitemap.xml".into()
        }
    }
}

// ============================================================================
// [permalinks] Section Defaults
// ============================================================================

pub mod permalinks {
    pub fn posts() -> String {
        "/:year/:month/:day/:slug/".into()
    }

    pub fn pages() -> String {
        "/:slug/".into()
    }

    pub fn archive() -> String {
        "/blog/".into()
    }
}

// ============================================================================
// [taxonomies] Section Defaults
// ============================================================================

/// taxonomy name → URL base path
pub fn taxonomies() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("categories".to_string(), "categories".to_string()),
        ("tags".to_string(), "tags".to_string()),
    ])
}
