//! Host adaptor.
//!
//! [`HostAdaptor`] binds a [`Renderer`] to a fresh host tree, update queue and
//! lifecycle bus. The resulting [`AdaptorInstance`] decides when a commit
//! becomes visible:
//!
//! - [`ResolutionMode::Automatic`]: a commit is applied before
//!   [`CommitSink::commit`] returns.
//! - [`ResolutionMode::Manual`]: commits stay pending until the caller
//!   resolves them with [`AdaptorInstance::resolve_update_callback`], in any
//!   order.
//!
//! [`AdaptorInstance::container`] only ever shows resolved state.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{AdaptorError, Result};
use crate::event::EventProxy;
use crate::lifecycle::{LifecycleBus, LifecycleProvider};
use crate::logging::{targets, HostTreeDebug};
use crate::mutation::Mutation;
use crate::node::{HostNode, HostTree};
use crate::queue::{RenderId, UpdateQueue, UpdateState};
use crate::renderer::{MountContext, Renderer};

/// When commits are applied to the host tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMode {
    /// Apply each commit immediately.
    #[default]
    Automatic,
    /// Buffer commits until explicitly resolved.
    Manual,
}

/// Adaptor configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptorConfig {
    /// Mode the instance starts in, before the first commit.
    pub initial_mode: ResolutionMode,
}

impl AdaptorConfig {
    /// Configuration that starts in manual mode.
    pub fn manual() -> Self {
        Self {
            initial_mode: ResolutionMode::Manual,
        }
    }
}

struct AdaptorState {
    tree: HostTree,
    queue: UpdateQueue,
    mode: ResolutionMode,
    mounted: bool,
}

impl AdaptorState {
    fn new(mode: ResolutionMode) -> Self {
        Self {
            tree: HostTree::new(),
            queue: UpdateQueue::new(),
            mode,
            mounted: true,
        }
    }

    fn on_commit(&mut self, render_id: RenderId, mutations: Vec<Mutation>) -> Result<()> {
        if !self.mounted {
            return Err(AdaptorError::NotMounted);
        }
        self.queue.enqueue(render_id.clone(), mutations)?;
        match self.mode {
            ResolutionMode::Automatic => self.resolve(Some(&render_id)).map(|_| ()),
            ResolutionMode::Manual => {
                tracing::debug!(target: targets::ADAPTOR, %render_id, pending = self.queue.pending_count(), "commit deferred");
                Ok(())
            }
        }
    }

    /// Apply a pending entry and mark it resolved.
    ///
    /// If the batch fails the tree is unchanged and the entry stays pending.
    fn resolve(&mut self, render_id: Option<&RenderId>) -> Result<RenderId> {
        let entry = match render_id {
            Some(id) => self.queue.pending_entry(id)?,
            None => self.queue.oldest_pending()?,
        };
        let id = entry.render_id().clone();
        self.tree.apply_batch(entry.mutations())?;
        self.queue.mark_resolved(&id)?;
        tracing::debug!(target: targets::ADAPTOR, render_id = %id, nodes = self.tree.len(), "update resolved");
        Ok(id)
    }
}

/// Handle through which a renderer reports commits.
///
/// Cheap to clone. Holds only a weak reference to the instance, so a renderer
/// that outlives its instance gets [`AdaptorError::NotMounted`].
#[derive(Clone)]
pub struct CommitSink {
    state: Weak<Mutex<AdaptorState>>,
}

impl CommitSink {
    /// Report one flushed render pass.
    ///
    /// In automatic mode the mutations are applied before this returns; in
    /// manual mode they are queued as pending.
    #[tracing::instrument(skip(self, mutations), target = "horizon_bridge_core::adaptor", level = "trace")]
    pub fn commit(&self, render_id: RenderId, mutations: Vec<Mutation>) -> Result<()> {
        let state = self.state.upgrade().ok_or(AdaptorError::NotMounted)?;
        let mut state = state.lock();
        state.on_commit(render_id, mutations)
    }

    /// Whether `render_id` is pending or was recently resolved, so a commit
    /// under it would be rejected.
    pub fn is_known(&self, render_id: &RenderId) -> bool {
        self.state
            .upgrade()
            .is_some_and(|state| state.lock().queue.state(render_id).is_some())
    }
}

impl fmt::Debug for CommitSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommitSink")
            .field("alive", &(self.state.strong_count() > 0))
            .finish()
    }
}

/// Binds a renderer to a host tree.
///
/// An adaptor can be run once; the renderer moves into the returned
/// [`AdaptorInstance`].
///
/// # Example
///
/// ```
/// use horizon_bridge_core::testing::ScriptedRenderer;
/// use horizon_bridge_core::{HostAdaptor, HostElement, InstanceId};
///
/// let mut adaptor = HostAdaptor::new(ScriptedRenderer::new());
/// let instance = adaptor
///     .run(Some(HostElement::new(InstanceId::new(1), "view")))
///     .unwrap();
/// assert_eq!(instance.container().children.len(), 1);
/// assert!(adaptor.run(None).is_err());
/// ```
pub struct HostAdaptor<R: Renderer> {
    renderer: Option<R>,
    config: AdaptorConfig,
    event_proxy: Option<Arc<dyn EventProxy>>,
}

impl<R: Renderer> HostAdaptor<R> {
    /// Create an adaptor with the default configuration.
    pub fn new(renderer: R) -> Self {
        Self::with_config(renderer, AdaptorConfig::default())
    }

    /// Create an adaptor with a custom configuration.
    pub fn with_config(renderer: R, config: AdaptorConfig) -> Self {
        Self {
            renderer: Some(renderer),
            config,
            event_proxy: None,
        }
    }

    /// Forward host lifecycle events from `proxy` to each instance's bus.
    pub fn with_event_proxy(mut self, proxy: Arc<dyn EventProxy>) -> Self {
        self.event_proxy = Some(proxy);
        self
    }

    /// Whether [`run`](Self::run) has already been called.
    pub fn is_bound(&self) -> bool {
        self.renderer.is_none()
    }

    /// Mount `root` and return the live instance.
    ///
    /// The lifecycle provider is attached before the renderer mounts, so host
    /// events fired during the first render are cached.
    ///
    /// Fails with [`AdaptorError::InvalidRoot`] if the adaptor is already
    /// bound.
    pub fn run(&mut self, root: Option<R::Element>) -> Result<AdaptorInstance<R>> {
        let mut renderer = self.renderer.take().ok_or(AdaptorError::InvalidRoot)?;

        let state = Arc::new(Mutex::new(AdaptorState::new(self.config.initial_mode)));
        let lifecycle = Arc::new(LifecycleBus::new());
        let provider = self
            .event_proxy
            .as_deref()
            .map(|proxy| LifecycleProvider::attach(proxy, lifecycle.clone()));

        let sink = CommitSink {
            state: Arc::downgrade(&state),
        };
        tracing::debug!(target: targets::ADAPTOR, has_root = root.is_some(), mode = ?self.config.initial_mode, "mounting renderer");
        renderer.mount(root, MountContext::new(sink, lifecycle.clone()))?;

        Ok(AdaptorInstance {
            state,
            lifecycle,
            provider,
            renderer,
        })
    }
}

impl<R: Renderer> fmt::Debug for HostAdaptor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostAdaptor")
            .field("bound", &self.is_bound())
            .field("config", &self.config)
            .field("event_proxy", &self.event_proxy.is_some())
            .finish()
    }
}

/// A mounted renderer with its host tree, update queue and lifecycle bus.
///
/// Unmounts on drop.
pub struct AdaptorInstance<R: Renderer> {
    state: Arc<Mutex<AdaptorState>>,
    lifecycle: Arc<LifecycleBus>,
    provider: Option<LifecycleProvider>,
    renderer: R,
}

impl<R: Renderer> AdaptorInstance<R> {
    /// Snapshot of the resolved host tree, rooted at the container.
    pub fn container(&self) -> HostNode {
        self.state.lock().tree.snapshot()
    }

    /// Apply a pending commit.
    ///
    /// With `Some(id)`, resolves exactly that entry; fails with
    /// [`AdaptorError::UnknownRenderId`] if it is not pending. With `None`,
    /// resolves the oldest pending entry; fails with
    /// [`AdaptorError::NoPendingUpdate`] if there is none.
    ///
    /// Returns the id that was resolved.
    pub fn resolve_update_callback(&self, render_id: Option<&RenderId>) -> Result<RenderId> {
        self.state.lock().resolve(render_id)
    }

    /// Switch between manual and automatic resolution.
    ///
    /// Pending entries are not touched; only later commits are affected.
    pub fn set_manually_resolved_update_callback(&self, enabled: bool) {
        let mode = if enabled {
            ResolutionMode::Manual
        } else {
            ResolutionMode::Automatic
        };
        let mut state = self.state.lock();
        state.mode = mode;
        tracing::debug!(target: targets::ADAPTOR, ?mode, pending = state.queue.pending_count(), "resolution mode changed");
    }

    /// Current resolution mode.
    pub fn resolution_mode(&self) -> ResolutionMode {
        self.state.lock().mode
    }

    /// Pending render ids in commit order.
    pub fn pending_render_ids(&self) -> Vec<RenderId> {
        self.state.lock().queue.pending_ids()
    }

    /// State of a render id, or `None` if it was never committed.
    pub fn update_state(&self, render_id: &RenderId) -> Option<UpdateState> {
        self.state.lock().queue.state(render_id)
    }

    /// A sink for commits that do not come from the renderer's own flushes.
    pub fn commit_sink(&self) -> CommitSink {
        CommitSink {
            state: Arc::downgrade(&self.state),
        }
    }

    /// The instance's lifecycle bus.
    pub fn lifecycle(&self) -> &Arc<LifecycleBus> {
        &self.lifecycle
    }

    /// The mounted renderer.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// The mounted renderer, mutably.
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Render the resolved tree for debugging.
    pub fn debug_tree(&self) -> String {
        HostTreeDebug::new().format(&self.container())
    }

    /// Whether the instance is still mounted.
    pub fn is_mounted(&self) -> bool {
        self.state.lock().mounted
    }

    /// Unmount the renderer and release everything the instance owns.
    ///
    /// Host lifecycle handlers are removed, the bus is torn down, and the
    /// tree and queue are cleared. Later commits fail with
    /// [`AdaptorError::NotMounted`]. Calling this again does nothing.
    pub fn unmount(&mut self) {
        {
            let mut state = self.state.lock();
            if !state.mounted {
                return;
            }
            state.mounted = false;
            state.tree.clear();
            state.queue.clear();
        }
        self.renderer.unmount();
        if let Some(mut provider) = self.provider.take() {
            provider.detach();
        }
        self.lifecycle.teardown();
        tracing::debug!(target: targets::ADAPTOR, "adaptor instance unmounted");
    }
}

impl<R: Renderer> Drop for AdaptorInstance<R> {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl<R: Renderer> fmt::Debug for AdaptorInstance<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("AdaptorInstance")
            .field("mode", &state.mode)
            .field("mounted", &state.mounted)
            .field("nodes", &state.tree.len())
            .field("pending", &state.queue.pending_count())
            .finish()
    }
}
