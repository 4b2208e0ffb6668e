//! Contract between the adaptor and the UI-framework renderer.
//!
//! The renderer is opaque: it decides when to flush its own work and reports
//! each flush as a commit through the [`CommitSink`] it received on mount.

use std::sync::Arc;

use crate::adaptor::CommitSink;
use crate::error::Result;
use crate::lifecycle::LifecycleBus;

/// A UI-framework renderer the adaptor can drive.
pub trait Renderer {
    /// Root element type accepted by [`mount`](Self::mount).
    type Element;

    /// Start rendering `root` (or nothing, for `None`).
    ///
    /// The renderer keeps `cx` and reports every flush through
    /// [`MountContext::sink`], during this call or later.
    fn mount(&mut self, root: Option<Self::Element>, cx: MountContext) -> Result<()>;

    /// Stop rendering. Called once when the adaptor instance unmounts.
    fn unmount(&mut self) {}
}

/// What a renderer receives when it is mounted.
#[derive(Debug, Clone)]
pub struct MountContext {
    sink: CommitSink,
    lifecycle: Arc<LifecycleBus>,
}

impl MountContext {
    pub(crate) fn new(sink: CommitSink, lifecycle: Arc<LifecycleBus>) -> Self {
        Self { sink, lifecycle }
    }

    /// Where commits go.
    pub fn sink(&self) -> &CommitSink {
        &self.sink
    }

    /// The instance's lifecycle bus, for hooks in the rendered tree.
    pub fn lifecycle(&self) -> &Arc<LifecycleBus> {
        &self.lifecycle
    }

    /// Split into parts.
    pub fn into_parts(self) -> (CommitSink, Arc<LifecycleBus>) {
        (self.sink, self.lifecycle)
    }
}
