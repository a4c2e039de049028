//! URL and destination-path resolution for content items.
//!
//! Maps a source file plus its metadata onto a site-absolute URL and an
//! output path, honoring explicit URL overrides, permalink templates and
//! the pretty-URL convention.
//!
//! # Resolution priority
//!
//! | Input | URL |
//! |-------|-----|
//! | `url: /custom/` in frontmatter | `/custom/` |
//! | root `index.*` of the content tree | `/` |
//! | permalink template + slug | e.g. `/2024/01/15/hello-world/` |
//!
//! Destination paths never carry a leading slash and end in `index.html`
//! unless the URL names a real file (`/feed.xml` → `feed.xml`).

use crate::site::Metadata;
use chrono::{Datelike, NaiveDateTime};

/// Fallback slug for titles that slugify to nothing
const EMPTY_SLUG: &str = "untitled";

// ============================================================================
// Slugification
// ============================================================================

/// Convert arbitrary text into a URL-safe slug.
///
/// Lowercases, strips everything outside `[a-z0-9\s-]`, collapses
/// whitespace runs and repeated hyphens into a single hyphen, and trims
/// leading/trailing hyphens. An empty result becomes `untitled`.
///
/// Idempotent: `slugify(slugify(x)) == slugify(x)`.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.to_lowercase().chars() {
        if c.is_whitespace() || c == '-' {
            pending_hyphen = !out.is_empty();
        } else if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen {
                out.push('-');
                pending_hyphen = false;
            }
            out.push(c);
        }
        // everything else is stripped
    }

    if out.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        out
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Inputs for resolving one content item.
pub struct PermalinkInput<'a> {
    /// Source path relative to the content root, e.g. `posts/hello.md`
    pub rel_source: &'a str,
    /// Parsed frontmatter for the item
    pub meta: &'a Metadata,
    /// Permalink template for the item's type
    pub template: &'a str,
    /// Publish date, available for posts
    pub date: Option<NaiveDateTime>,
    /// URL prefix for drafts built under relaxed rules, e.g. `drafts`
    pub draft_prefix: Option<&'a str>,
}

/// A resolved (URL, destination path) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Site-absolute URL, always starting with `/`
    pub url: String,
    /// Output path relative to the output root, no leading `/`
    pub dest: String,
}

/// Compute the URL and destination path for one content item.
///
/// Priority: explicit `url:` override, then the root index special case,
/// then the permalink template filled from slug and date. Drafts built
/// under relaxed rules are prefixed under the drafts base; an explicit URL
/// override is honored verbatim even for drafts.
pub fn resolve(input: &PermalinkInput) -> Resolved {
    if let Some(explicit) = input.meta.url.as_deref() {
        let url = normalize_url(explicit);
        let dest = destination_for_url(&url);
        return Resolved { url, dest };
    }

    let url = if is_root_index(input.rel_source) {
        "/".to_string()
    } else {
        expand_template(input)
    };

    let url = match input.draft_prefix {
        Some(prefix) => normalize_url(&format!("/{prefix}{url}")),
        None => url,
    };

    let dest = destination_for_url(&url);
    Resolved { url, dest }
}

/// Derive the output path for a URL.
///
/// `/` maps to `index.html`; pretty URLs gain an `index.html` leaf; URLs
/// that name a file keep their path as-is (minus the leading slash).
pub fn destination_for_url(url: &str) -> String {
    if url == "/" {
        return "index.html".to_string();
    }
    if has_extension(url) {
        return url.trim_start_matches('/').to_string();
    }
    let trimmed = url.trim_start_matches('/').trim_end_matches('/');
    format!("{trimmed}/index.html")
}

/// Normalize a URL: single leading slash, duplicate slashes collapsed,
/// trailing slash appended unless the last segment carries an extension.
pub fn normalize_url(url: &str) -> String {
    let mut out = String::with_capacity(url.len() + 2);
    out.push('/');
    let mut prev_slash = true;
    for c in url.chars() {
        if c == '/' {
            if !prev_slash {
                out.push('/');
            }
            prev_slash = true;
        } else {
            out.push(c);
            prev_slash = false;
        }
    }
    if !out.ends_with('/') && !has_extension(&out) {
        out.push('/');
    }
    out
}

// ============================================================================
// Helpers
// ============================================================================

/// True when the source file is the root `index.*` of the content tree.
fn is_root_index(rel_source: &str) -> bool {
    !rel_source.contains('/') && file_stem(rel_source) == "index"
}

/// Fill the permalink template from metadata, filename and date.
fn expand_template(input: &PermalinkInput) -> String {
    let slug = pick_slug(input.rel_source, input.meta);

    let mut url = input.template.replace(":slug", &slug).replace(":title", &slug);

    if let Some(date) = input.date {
        url = url
            .replace(":year", &format!("{:04}", date.year()))
            .replace(":month", &format!("{:02}", date.month()))
            .replace(":day", &format!("{:02}", date.day()));
    }

    normalize_url(&url)
}

/// Pick the slug source: explicit slug, then title, then filename.
///
/// An `index` filename falls back to its parent directory name, so bundle
/// layouts like `posts/hello-world/index.md` slug as `hello-world`.
fn pick_slug(rel_source: &str, meta: &Metadata) -> String {
    if let Some(slug) = meta.slug.as_deref() {
        return slugify(slug);
    }
    if let Some(title) = meta.title.as_deref() {
        return slugify(title);
    }

    let stem = file_stem(rel_source);
    if stem == "index" {
        if let Some(parent) = rel_source.rsplit('/').nth(1) {
            return slugify(parent);
        }
    }
    slugify(stem)
}

/// Last path segment without its extension.
fn file_stem(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

/// True when the last URL segment carries a file extension.
fn has_extension(url: &str) -> bool {
    let segment = url.rsplit('/').next().unwrap_or("");
    segment.rfind('.').is_some_and(|idx| idx > 0 && idx + 1 < segment.len())
}

// ============================================================================
// Tests
// ============================================================================
