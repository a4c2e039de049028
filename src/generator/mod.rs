//! Built-in output generators, packaged as pipeline plugins.
//!
//! Both run at [`PipelineStage::PostBuild`] so they see the final item
//! set, and both are gated by their `build.feed` / `build.sitemap`
//! config sections.
//!
//! [`PipelineStage::PostBuild`]: crate::plugin::PipelineStage::PostBuild

mod feed;
mod sitemap;

pub use feed::FeedPlugin;
pub use sitemap::SitemapPlugin;
