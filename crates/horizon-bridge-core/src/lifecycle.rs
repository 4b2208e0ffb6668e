//! Lifecycle bus for Horizon Bridge.
//!
//! Host runtime lifecycle callbacks are one-shot: launch options arrive once
//! in `onLoad`, and a hook mounted after that would never see them. The
//! [`LifecycleBus`] keeps the last value emitted for every
//! [`LifecycleName`] and replays it to late subscribers before forwarding
//! live emissions.
//!
//! # Key Types
//!
//! - [`LifecycleBus`] - Cache plus per-signal subscriber lists
//! - [`Subscription`] - Handle that removes a subscriber
//! - [`SubscriptionGuard`] - RAII alternative that unsubscribes on drop
//! - [`LifecycleProvider`] - Wires host events from an [`EventProxy`] to a bus
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_bridge_core::{LifecycleBus, LifecycleEvent, LifecycleName};
//!
//! let bus = Arc::new(LifecycleBus::new());
//! bus.emit(LifecycleEvent::Visibility(true));
//!
//! // A late subscriber is replayed the cached value immediately.
//! let sub = bus.subscribe(LifecycleName::Visibility, |event| {
//!     println!("visibility: {event:?}");
//! });
//! bus.emit(LifecycleEvent::Visibility(false));
//! sub.unsubscribe();
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::event::{EventProxy, EventSubscription, HostEvent};
use crate::logging::targets;

/// Launch query options delivered with `onLoad`.
pub type LoadOptions = BTreeMap<String, String>;

/// The fixed set of lifecycle signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LifecycleName {
    /// Launch options from `onLoad`.
    LoadOptions,
    /// Page visibility from `onShow` / `onHide`.
    Visibility,
}

impl LifecycleName {
    /// Signal name as exposed to application code.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoadOptions => "loadOptions",
            Self::Visibility => "visibility",
        }
    }
}

impl fmt::Display for LifecycleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lifecycle signal together with its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", content = "data", rename_all = "camelCase")]
pub enum LifecycleEvent {
    /// Launch options.
    LoadOptions(LoadOptions),
    /// Whether the page is visible.
    Visibility(bool),
}

impl LifecycleEvent {
    /// The signal this value belongs to.
    pub fn name(&self) -> LifecycleName {
        match self {
            Self::LoadOptions(_) => LifecycleName::LoadOptions,
            Self::Visibility(_) => LifecycleName::Visibility,
        }
    }
}

/// Convert an `onLoad` payload into [`LoadOptions`].
///
/// Object entries with string values are taken as is, other scalars are
/// rendered to strings and nulls are skipped. Non-object payloads yield an
/// empty map.
pub fn load_options_from_payload(payload: &Value) -> LoadOptions {
    let Value::Object(map) = payload else {
        return LoadOptions::new();
    };
    map.iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((key.clone(), value))
        })
        .collect()
}

type Callback = Arc<dyn Fn(&LifecycleEvent) + Send + Sync>;

struct Subscriber {
    id: u64,
    callback: Callback,
}

#[derive(Default)]
struct BusState {
    next_id: u64,
    cache: HashMap<LifecycleName, LifecycleEvent>,
    subscribers: HashMap<LifecycleName, Vec<Subscriber>>,
}

/// Cache-plus-broadcast channel for lifecycle signals.
///
/// One bus exists per rendered application instance. It is shared as
/// `Arc<LifecycleBus>` with every consumer and cleared by
/// [`teardown`](Self::teardown) when the instance unmounts.
///
/// Callbacks are invoked without the internal lock held, so a callback may
/// subscribe, unsubscribe or emit.
pub struct LifecycleBus {
    state: Arc<Mutex<BusState>>,
}

impl Default for LifecycleBus {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleBus {
    /// Create a bus with an empty cache and no subscribers.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(BusState::default())),
        }
    }

    /// Cache `event` and deliver it to the current subscribers of its
    /// signal, in subscription order.
    #[tracing::instrument(skip_all, target = "horizon_bridge_core::lifecycle", level = "trace")]
    pub fn emit(&self, event: LifecycleEvent) {
        let name = event.name();
        let callbacks: Vec<Callback> = {
            let mut state = self.state.lock();
            state.cache.insert(name, event.clone());
            state
                .subscribers
                .get(&name)
                .map(|subs| subs.iter().map(|s| s.callback.clone()).collect())
                .unwrap_or_default()
        };
        tracing::debug!(target: targets::LIFECYCLE, %name, subscribers = callbacks.len(), "emitting lifecycle signal");

        for callback in callbacks {
            callback(&event);
        }
    }

    /// Subscribe to `name`.
    ///
    /// If a value has already been emitted for `name`, `callback` is invoked
    /// with it before this returns. Later emissions are delivered until the
    /// returned [`Subscription`] is unsubscribed.
    pub fn subscribe<F>(&self, name: LifecycleName, callback: F) -> Subscription
    where
        F: Fn(&LifecycleEvent) + Send + Sync + 'static,
    {
        let callback: Callback = Arc::new(callback);
        let (id, cached) = {
            let mut state = self.state.lock();
            let id = state.next_id;
            state.next_id += 1;
            state.subscribers.entry(name).or_default().push(Subscriber {
                id,
                callback: callback.clone(),
            });
            (id, state.cache.get(&name).cloned())
        };

        if let Some(cached) = cached {
            tracing::trace!(target: targets::LIFECYCLE, %name, "replaying cached lifecycle value");
            callback(&cached);
        }

        Subscription {
            state: Arc::downgrade(&self.state),
            name,
            id,
        }
    }

    /// Subscribe with automatic removal when the guard is dropped.
    pub fn subscribe_scoped<F>(&self, name: LifecycleName, callback: F) -> SubscriptionGuard
    where
        F: Fn(&LifecycleEvent) + Send + Sync + 'static,
    {
        SubscriptionGuard {
            subscription: self.subscribe(name, callback),
        }
    }

    /// The last value emitted for `name`.
    pub fn cached(&self, name: LifecycleName) -> Option<LifecycleEvent> {
        self.state.lock().cache.get(&name).cloned()
    }

    /// Number of active subscribers for `name`.
    pub fn subscriber_count(&self, name: LifecycleName) -> usize {
        self.state
            .lock()
            .subscribers
            .get(&name)
            .map_or(0, Vec::len)
    }

    /// Clear the cache and drop every subscriber.
    pub fn teardown(&self) {
        let mut state = self.state.lock();
        state.cache.clear();
        state.subscribers.clear();
        tracing::debug!(target: targets::LIFECYCLE, "lifecycle bus torn down");
    }
}

impl fmt::Debug for LifecycleBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("LifecycleBus")
            .field("cache", &state.cache)
            .field(
                "subscribers",
                &state.subscribers.values().map(Vec::len).sum::<usize>(),
            )
            .finish()
    }
}

/// Handle returned by [`LifecycleBus::subscribe`].
///
/// Unsubscribing is idempotent and safe after the bus is gone. Dropping the
/// handle keeps the subscription alive; use
/// [`LifecycleBus::subscribe_scoped`] for drop-based removal.
#[must_use = "the handle is the only way to unsubscribe"]
#[derive(Debug, Clone)]
pub struct Subscription {
    state: Weak<Mutex<BusState>>,
    name: LifecycleName,
    id: u64,
}

impl Subscription {
    /// The signal this subscription listens to.
    pub fn name(&self) -> LifecycleName {
        self.name
    }

    /// Stop receiving emissions.
    pub fn unsubscribe(&self) {
        let Some(state) = self.state.upgrade() else {
            return;
        };
        let mut state = state.lock();
        if let Some(subs) = state.subscribers.get_mut(&self.name) {
            subs.retain(|s| s.id != self.id);
        }
    }
}

/// A subscription that unsubscribes when dropped.
#[derive(Debug)]
pub struct SubscriptionGuard {
    subscription: Subscription,
}

impl SubscriptionGuard {
    /// The underlying handle.
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
    }
}

/// Forwards host page events to a [`LifecycleBus`].
///
/// - `onLoad` emits [`LifecycleEvent::LoadOptions`]
/// - `onShow` emits [`LifecycleEvent::Visibility`]`(true)`
/// - `onHide` emits [`LifecycleEvent::Visibility`]`(false)`
///
/// The host handlers are removed by [`detach`](Self::detach) or on drop.
pub struct LifecycleProvider {
    bus: Arc<LifecycleBus>,
    registrations: Vec<EventSubscription>,
}

impl LifecycleProvider {
    /// Register the host handlers on `proxy`.
    pub fn attach(proxy: &dyn EventProxy, bus: Arc<LifecycleBus>) -> Self {
        let mut registrations = Vec::with_capacity(3);

        let target = Arc::downgrade(&bus);
        registrations.push(proxy.handle_event(
            HostEvent::OnLoad,
            Arc::new(move |payload: &Value| {
                if let Some(bus) = target.upgrade() {
                    bus.emit(LifecycleEvent::LoadOptions(load_options_from_payload(payload)));
                }
            }),
        ));

        for (event, visible) in [(HostEvent::OnShow, true), (HostEvent::OnHide, false)] {
            let target = Arc::downgrade(&bus);
            registrations.push(proxy.handle_event(
                event,
                Arc::new(move |_: &Value| {
                    if let Some(bus) = target.upgrade() {
                        bus.emit(LifecycleEvent::Visibility(visible));
                    }
                }),
            ));
        }

        tracing::debug!(target: targets::LIFECYCLE, "lifecycle provider attached");
        Self { bus, registrations }
    }

    /// The bus this provider feeds.
    pub fn bus(&self) -> &Arc<LifecycleBus> {
        &self.bus
    }

    /// Remove the host handlers. Calling this again does nothing.
    pub fn detach(&mut self) {
        if self.registrations.is_empty() {
            return;
        }
        for registration in self.registrations.drain(..) {
            registration.unsubscribe();
        }
        tracing::debug!(target: targets::LIFECYCLE, "lifecycle provider detached");
    }
}

impl Drop for LifecycleProvider {
    fn drop(&mut self) {
        self.detach();
    }
}

impl fmt::Debug for LifecycleProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleProvider")
            .field("attached", &!self.registrations.is_empty())
            .finish()
    }
}

static_assertions::assert_impl_all!(LifecycleBus: Send, Sync);
static_assertions::assert_impl_all!(Subscription: Send, Sync);
