//! Test harness for code that renders through the adaptor.
//!
//! [`render`] mounts a static [`HostElement`] tree with a
//! [`ScriptedRenderer`] and returns a [`RenderResult`] for inspecting the
//! host tree and stepping through commits.
//!
//! ```
//! use horizon_bridge_core::testing::render;
//! use horizon_bridge_core::{HostElement, InstanceId, Mutation};
//!
//! let result = render(Some(HostElement::new(InstanceId::new(1), "view"))).unwrap();
//! result.set_manually_resolved_update_callback(true);
//!
//! result
//!     .commit_with_id("a", vec![Mutation::set_text(InstanceId::new(1), "hello")])
//!     .unwrap();
//! assert_eq!(result.container().children[0].text, None);
//!
//! result.resolve_update_callback(Some("a")).unwrap();
//! assert_eq!(result.container().children[0].text.as_deref(), Some("hello"));
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::adaptor::{AdaptorConfig, AdaptorInstance, CommitSink, HostAdaptor};
use crate::error::{AdaptorError, QueryError, Result};
use crate::event::EventProxy;
use crate::lifecycle::LifecycleBus;
use crate::mutation::{HostElement, Mutation};
use crate::node::{HostNode, InstanceId};
use crate::queue::{RenderId, RenderIdGenerator};
use crate::renderer::{MountContext, Renderer};

#[derive(Default)]
struct ScriptState {
    sink: Option<CommitSink>,
    lifecycle: Option<Arc<LifecycleBus>>,
    ids: RenderIdGenerator,
}

/// Renderer driven by hand.
///
/// On mount it commits the whole root element as one insert. Afterwards
/// every call to [`commit`](Self::commit) stands in for one flush of a real
/// renderer. Clones share the same mount.
#[derive(Clone, Default)]
pub struct ScriptedRenderer {
    inner: Arc<Mutex<ScriptState>>,
}

impl ScriptedRenderer {
    /// Create an unmounted renderer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flush `mutations` under a freshly generated render id.
    ///
    /// Generated ids skip any id the adaptor already knows, including ids
    /// the caller chose through [`commit_with_id`](Self::commit_with_id).
    pub fn commit(&self, mutations: Vec<Mutation>) -> Result<RenderId> {
        let sink = self
            .inner
            .lock()
            .sink
            .clone()
            .ok_or(AdaptorError::NotMounted)?;
        let mut render_id = self.inner.lock().ids.next_id();
        while sink.is_known(&render_id) {
            render_id = self.inner.lock().ids.next_id();
        }
        sink.commit(render_id.clone(), mutations)?;
        Ok(render_id)
    }

    /// Flush `mutations` under a caller-chosen render id.
    pub fn commit_with_id(&self, render_id: impl Into<RenderId>, mutations: Vec<Mutation>) -> Result<()> {
        let sink = self
            .inner
            .lock()
            .sink
            .clone()
            .ok_or(AdaptorError::NotMounted)?;
        sink.commit(render_id.into(), mutations)
    }

    /// The lifecycle bus handed over on mount.
    pub fn lifecycle(&self) -> Option<Arc<LifecycleBus>> {
        self.inner.lock().lifecycle.clone()
    }

    /// Whether the renderer is mounted.
    pub fn is_mounted(&self) -> bool {
        self.inner.lock().sink.is_some()
    }
}

impl Renderer for ScriptedRenderer {
    type Element = HostElement;

    fn mount(&mut self, root: Option<HostElement>, cx: MountContext) -> Result<()> {
        let (sink, lifecycle) = cx.into_parts();
        {
            let mut inner = self.inner.lock();
            inner.sink = Some(sink);
            inner.lifecycle = Some(lifecycle);
        }
        if let Some(root) = root {
            self.commit(vec![Mutation::append(InstanceId::CONTAINER, root)])?;
        }
        Ok(())
    }

    fn unmount(&mut self) {
        let mut inner = self.inner.lock();
        inner.sink = None;
        inner.lifecycle = None;
    }
}

impl fmt::Debug for ScriptedRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedRenderer")
            .field("mounted", &self.is_mounted())
            .finish()
    }
}

/// Options for [`render_with`].
#[derive(Clone, Default)]
pub struct RenderOptions {
    /// Adaptor configuration.
    pub config: AdaptorConfig,
    /// Host event source wired to the lifecycle bus.
    pub event_proxy: Option<Arc<dyn EventProxy>>,
}

/// Mount `root` with default options.
///
/// `None` renders an empty tree.
pub fn render(root: Option<HostElement>) -> Result<RenderResult> {
    render_with(root, RenderOptions::default())
}

/// Mount `root` with custom options.
pub fn render_with(root: Option<HostElement>, options: RenderOptions) -> Result<RenderResult> {
    let mut adaptor = HostAdaptor::with_config(ScriptedRenderer::new(), options.config);
    if let Some(proxy) = options.event_proxy {
        adaptor = adaptor.with_event_proxy(proxy);
    }
    let instance = adaptor.run(root)?;
    Ok(RenderResult { instance })
}

/// A mounted test render.
#[derive(Debug)]
pub struct RenderResult {
    instance: AdaptorInstance<ScriptedRenderer>,
}

impl RenderResult {
    /// Snapshot of the resolved host tree.
    pub fn container(&self) -> HostNode {
        self.instance.container()
    }

    /// Resolve a pending commit by id, or the oldest one for `None`.
    pub fn resolve_update_callback(&self, render_id: Option<&str>) -> Result<RenderId> {
        let render_id = render_id.map(RenderId::from);
        self.instance.resolve_update_callback(render_id.as_ref())
    }

    /// Switch between manual and automatic resolution.
    pub fn set_manually_resolved_update_callback(&self, enabled: bool) {
        self.instance.set_manually_resolved_update_callback(enabled);
    }

    /// Push a commit through the renderer under a generated id.
    pub fn commit(&self, mutations: Vec<Mutation>) -> Result<RenderId> {
        self.instance.renderer().commit(mutations)
    }

    /// Push a commit through the renderer under `render_id`.
    pub fn commit_with_id(&self, render_id: impl Into<RenderId>, mutations: Vec<Mutation>) -> Result<()> {
        self.instance.renderer().commit_with_id(render_id, mutations)
    }

    /// Pending render ids in commit order.
    pub fn pending_render_ids(&self) -> Vec<RenderId> {
        self.instance.pending_render_ids()
    }

    /// The instance's lifecycle bus.
    pub fn lifecycle(&self) -> &Arc<LifecycleBus> {
        self.instance.lifecycle()
    }

    /// The underlying adaptor instance.
    pub fn instance(&self) -> &AdaptorInstance<ScriptedRenderer> {
        &self.instance
    }

    /// Unmount the render.
    pub fn unmount(&mut self) {
        self.instance.unmount();
    }

    /// Find the single node whose text matches.
    ///
    /// Matching semantics are not defined yet; always fails.
    pub fn get_by_text(&self, _text: &str) -> std::result::Result<HostNode, QueryError> {
        Err(QueryError::Unimplemented {
            query: "get_by_text",
        })
    }

    /// Like [`get_by_text`](Self::get_by_text) but without failing on no match.
    ///
    /// Matching semantics are not defined yet; always fails.
    pub fn query_by_text(&self, _text: &str) -> std::result::Result<Option<HostNode>, QueryError> {
        Err(QueryError::Unimplemented {
            query: "query_by_text",
        })
    }

    /// Find a node whose text matches once it appears.
    ///
    /// Matching semantics are not defined yet; always fails.
    pub fn find_by_text(&self, _text: &str) -> std::result::Result<HostNode, QueryError> {
        Err(QueryError::Unimplemented {
            query: "find_by_text",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_null_is_empty_container() {
        let result = render(None).unwrap();
        assert_eq!(result.container(), HostNode::empty_container());
        assert!(result.pending_render_ids().is_empty());
    }

    #[test]
    fn test_mount_commit_uses_generated_id() {
        let result = render_with(
            Some(HostElement::new(InstanceId::new(1), "view")),
            RenderOptions {
                config: AdaptorConfig::manual(),
                event_proxy: None,
            },
        )
        .unwrap();

        assert!(result.container().is_empty());
        assert_eq!(result.pending_render_ids(), vec![RenderId::from("render-1")]);
        result.resolve_update_callback(None).unwrap();
        assert_eq!(result.container().child_ids(), vec![InstanceId::new(1)]);
    }

    #[test]
    fn test_generated_ids_skip_caller_ids() {
        let result = render_with(
            None,
            RenderOptions {
                config: AdaptorConfig::manual(),
                event_proxy: None,
            },
        )
        .unwrap();

        assert_eq!(result.commit(Vec::new()).unwrap(), RenderId::from("render-1"));
        result.commit_with_id("render-2", Vec::new()).unwrap();
        assert_eq!(result.commit(Vec::new()).unwrap(), RenderId::from("render-3"));
        assert_eq!(
            result.pending_render_ids(),
            vec![
                RenderId::from("render-1"),
                RenderId::from("render-2"),
                RenderId::from("render-3"),
            ]
        );
    }

    #[test]
    fn test_renderer_sees_lifecycle_bus() {
        let result = render(None).unwrap();
        let bus = result.instance().renderer().lifecycle().unwrap();
        assert!(Arc::ptr_eq(&bus, result.lifecycle()));
    }

    #[test]
    fn test_text_queries_are_unimplemented() {
        let result = render(None).unwrap();
        assert_eq!(
            result.get_by_text("a").unwrap_err(),
            QueryError::Unimplemented {
                query: "get_by_text"
            }
        );
        assert!(result.query_by_text("a").is_err());
        assert!(result.find_by_text("a").is_err());
    }

    #[test]
    fn test_unmount_stops_renderer() {
        let mut result = render(None).unwrap();
        let renderer = result.instance().renderer().clone();
        result.unmount();
        assert!(!renderer.is_mounted());
        assert_eq!(renderer.commit(Vec::new()).unwrap_err(), AdaptorError::NotMounted);
    }
}
