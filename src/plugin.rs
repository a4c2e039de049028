//! Build pipeline plugins.
//!
//! Plugins run at fixed checkpoints between pipeline stages and get
//! exclusive access to the [`SiteContext`] plus both storage ends. A
//! plugin declares up front which stages it wants; the dispatcher never
//! calls it for any other stage.
//!
//! A plugin error is a per-item failure: it is logged, counted on the
//! context, and the build moves on to the next plugin.

use crate::log;
use crate::site::SiteContext;
use crate::storage::Storage;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Stages
// ============================================================================

/// Checkpoints at which plugins can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    /// After configuration load, before content discovery
    PreBuild,
    /// After discovery and parsing, before sorting/linking/taxonomies
    PostContentProcessing,
    /// After all items have been rendered and written
    PostRender,
    /// After assets; last chance to add output files
    PostBuild,
    /// After everything; the output is final
    BuildComplete,
}

impl PipelineStage {
    /// Every stage, in pipeline order.
    pub const ALL: [PipelineStage; 5] = [
        PipelineStage::PreBuild,
        PipelineStage::PostContentProcessing,
        PipelineStage::PostRender,
        PipelineStage::PostBuild,
        PipelineStage::BuildComplete,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PipelineStage::PreBuild => "pre-build",
            PipelineStage::PostContentProcessing => "post-content-processing",
            PipelineStage::PostRender => "post-render",
            PipelineStage::PostBuild => "post-build",
            PipelineStage::BuildComplete => "build-complete",
        }
    }
}

// ============================================================================
// Plugin Trait
// ============================================================================

/// A build extension invoked at declared pipeline checkpoints.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Stable name used in logs.
    fn name(&self) -> &str;

    /// Stages this plugin wants to run at.
    fn stages(&self) -> &[PipelineStage];

    /// Run at one of the declared stages.
    async fn execute(
        &self,
        stage: PipelineStage,
        ctx: &mut SiteContext,
        source: &dyn Storage,
        output: &dyn Storage,
        cancel: &CancellationToken,
    ) -> anyhow::Result<()>;
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Outcome of dispatching one checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Completed,
    Cancelled,
}

/// Routes checkpoints to registered plugins in registration order.
#[derive(Default)]
pub struct PluginDispatcher {
    by_stage: HashMap<PipelineStage, Vec<Arc<dyn Plugin>>>,
}

impl PluginDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin for the stages it declares.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        for &stage in plugin.stages() {
            self.by_stage.entry(stage).or_default().push(plugin.clone());
        }
    }

    /// Run every plugin registered for `stage`, in registration order.
    ///
    /// Cancellation is honored between plugins; a running plugin is
    /// expected to observe the token itself.
    pub async fn dispatch(
        &self,
        stage: PipelineStage,
        ctx: &mut SiteContext,
        source: &dyn Storage,
        output: &dyn Storage,
        cancel: &CancellationToken,
    ) -> Dispatch {
        let Some(plugins) = self.by_stage.get(&stage) else {
            return Dispatch::Completed;
        };

        for plugin in plugins {
            if cancel.is_cancelled() {
                return Dispatch::Cancelled;
            }
            if let Err(e) = plugin.execute(stage, ctx, source, output, cancel).await {
                log!("error"; "plugin `{}` failed at {}: {e:#}", plugin.name(), stage.name());
                ctx.record_error();
            }
        }
        Dispatch::Completed
    }
}

// ============================================================================
// Tests
// ============================================================================
