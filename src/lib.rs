//! Vellum - a storage-agnostic static site generator.
//!
//! A build runs a staged pipeline over two [`storage::Storage`] ends:
//! discover and parse content, sort and cross-link posts, aggregate
//! taxonomies, generate archive and taxonomy pages, render everything
//! through templates, then compile styles and copy static files. Plugins
//! hook the pipeline at fixed checkpoints.
//!
//! The CLI wires the pipeline to the local filesystem; embedders can run
//! the same pipeline over [`storage::MemoryStorage`] or their own
//! backend.

pub mod assets;
pub mod build;
pub mod cli;
pub mod config;
pub mod content;
pub mod generator;
pub mod logger;
pub mod permalink;
pub mod plugin;
pub mod render;
pub mod site;
pub mod storage;

pub use build::{BuildOutcome, BuildReport, SiteBuilder};
pub use config::SiteConfig;
pub use plugin::{PipelineStage, Plugin};
pub use site::SiteContext;
pub use storage::{LocalStorage, MemoryStorage, Storage};
