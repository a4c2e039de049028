//! Vellum - a storage-agnostic static site generator.

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use vellum::build::BuildOutcome;
use vellum::cli::{Cli, Commands};
use vellum::config::{ConfigOverrides, SiteConfig};
use vellum::generator::{FeedPlugin, SitemapPlugin};
use vellum::log;
use vellum::storage::LocalStorage;
use vellum::SiteBuilder;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let root = cli.root.as_deref().unwrap_or(Path::new("./")).to_path_buf();

    let Commands::Build { build_args } = &cli.command;

    let source = LocalStorage::new(&root);
    let overrides = ConfigOverrides {
        drafts: build_args.drafts,
        future: build_args.future,
    };

    // Pre-load configuration only to resolve the output directory; the
    // builder loads it again as part of the pipeline.
    let mut config = SiteConfig::load(&source, &cli.config).await?;
    config.apply_overrides(overrides);
    let output_dir = build_args
        .output
        .clone()
        .unwrap_or_else(|| config.build.output.clone().into());
    let output = LocalStorage::new(root.join(output_dir));

    let mut builder = SiteBuilder::new();
    builder.set_overrides(overrides);
    builder.set_minify(build_args.minify);
    builder.register_plugin(Arc::new(FeedPlugin));
    builder.register_plugin(Arc::new(SitemapPlugin));

    let cancel = CancellationToken::new();
    let signal_guard = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log!("build"; "interrupt received, finishing current item");
            signal_guard.cancel();
        }
    });

    let report = builder.build(&cli.config, &source, &output, &cancel).await?;

    match report.outcome {
        BuildOutcome::Cancelled => {
            log!("build"; "cancelled after {} items", report.posts + report.pages);
            std::process::exit(130);
        }
        BuildOutcome::Complete if report.item_errors > 0 => {
            log!("error"; "completed with {} item errors", report.item_errors);
            std::process::exit(1);
        }
        BuildOutcome::Complete => Ok(()),
    }
}
