//! Core systems for Horizon Bridge.
//!
//! Horizon Bridge runs a declarative UI renderer against a mini-program host
//! runtime that cannot run the renderer itself. This crate provides:
//!
//! - **Host Tree**: The mutable, serializable node tree the host paints from
//! - **Mutations**: Closed set of insert/update/move/remove operations
//! - **Update Queue**: Per-render-pass buffer of pending mutation batches
//! - **Host Adaptor**: Applies commits immediately or on demand
//! - **Lifecycle Bus**: Last-value cache plus broadcast for host lifecycle signals
//! - **Event Proxy**: Host page events (`onLoad`, `onShow`, `onHide`, ...)
//! - **Testing**: A scripted renderer and `render` harness
//!
//! # Adaptor Example
//!
//! ```
//! use horizon_bridge_core::testing::render;
//! use horizon_bridge_core::{HostElement, InstanceId, Mutation};
//!
//! let result = render(None).unwrap();
//! result.set_manually_resolved_update_callback(true);
//!
//! let root = InstanceId::CONTAINER;
//! result
//!     .commit_with_id("a", vec![Mutation::append(root, HostElement::new(InstanceId::new(1), "view"))])
//!     .unwrap();
//! result
//!     .commit_with_id("b", vec![Mutation::append(root, HostElement::new(InstanceId::new(2), "text"))])
//!     .unwrap();
//!
//! // Resolve out of order.
//! result.resolve_update_callback(Some("b")).unwrap();
//! assert_eq!(result.container().child_ids(), vec![InstanceId::new(2)]);
//! result.resolve_update_callback(Some("a")).unwrap();
//! assert_eq!(result.container().children.len(), 2);
//! ```
//!
//! # Lifecycle Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_bridge_core::{HostEvent, LifecycleBus, LifecycleProvider, LocalEventProxy};
//! use horizon_bridge_core::hooks::use_visibility;
//!
//! let proxy = LocalEventProxy::new();
//! let bus = Arc::new(LifecycleBus::new());
//! let _provider = LifecycleProvider::attach(&proxy, bus.clone());
//!
//! proxy.dispatch(HostEvent::OnShow, &serde_json::Value::Null);
//!
//! // Mounted after the event fired, still sees `true`.
//! let _sub = use_visibility(&bus, |visible| assert!(visible));
//! ```

mod adaptor;
mod error;
pub mod event;
pub mod hooks;
pub mod lifecycle;
pub mod logging;
pub mod mutation;
pub mod node;
pub mod queue;
pub mod renderer;
pub mod testing;

pub use adaptor::{AdaptorConfig, AdaptorInstance, CommitSink, HostAdaptor, ResolutionMode};
pub use error::{AdaptorError, QueryError, Result, TreeError};
pub use event::{EventHandler, EventProxy, EventSubscription, HostEvent, LocalEventProxy};
pub use lifecycle::{
    LifecycleBus, LifecycleEvent, LifecycleName, LifecycleProvider, LoadOptions, Subscription,
    SubscriptionGuard,
};
pub use logging::{HostTreeDebug, TreeFormatOptions, TreeStyle};
pub use mutation::{HostElement, Mutation, TextUpdate};
pub use node::{HostNode, HostTree, InstanceId, MAX_DEPTH};
pub use queue::{
    RenderId, RenderIdGenerator, UpdateEntry, UpdateQueue, UpdateState, RESOLVED_HISTORY,
};
pub use renderer::{MountContext, Renderer};
