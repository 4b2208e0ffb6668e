//! Host runtime event source.
//!
//! The host runtime delivers page lifecycle callbacks (`onLoad`, `onShow`,
//! ...) through an [`EventProxy`]. Integrations implement the trait over the
//! platform's page object; [`LocalEventProxy`] is an in-process
//! implementation that can be driven directly.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::logging::targets;

/// Host runtime page events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HostEvent {
    /// Page loaded; payload carries the launch query options.
    OnLoad,
    /// Page became visible.
    OnShow,
    /// Page was hidden.
    OnHide,
    /// First render finished.
    OnReady,
    /// Page is being destroyed.
    OnUnload,
}

impl HostEvent {
    /// Name used by the host runtime.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OnLoad => "onLoad",
            Self::OnShow => "onShow",
            Self::OnHide => "onHide",
            Self::OnReady => "onReady",
            Self::OnUnload => "onUnload",
        }
    }

    /// Parse a host runtime event name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "onLoad" => Some(Self::OnLoad),
            "onShow" => Some(Self::OnShow),
            "onHide" => Some(Self::OnHide),
            "onReady" => Some(Self::OnReady),
            "onUnload" => Some(Self::OnUnload),
            _ => None,
        }
    }
}

impl fmt::Display for HostEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Callback invoked with the event payload.
pub type EventHandler = Arc<dyn Fn(&Value) + Send + Sync>;

/// Source of host runtime events.
pub trait EventProxy: Send + Sync {
    /// Register `handler` for `event`, returning the handle that removes it.
    fn handle_event(&self, event: HostEvent, handler: EventHandler) -> EventSubscription;
}

/// Handle returned by [`EventProxy::handle_event`].
///
/// Calling [`unsubscribe`](Self::unsubscribe) more than once is a no-op.
/// Dropping the handle does not unsubscribe.
pub struct EventSubscription {
    cancel: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl EventSubscription {
    /// Wrap the closure that removes the handler.
    pub fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            cancel: Mutex::new(Some(Box::new(cancel))),
        }
    }

    /// A handle with nothing to remove.
    pub fn noop() -> Self {
        Self {
            cancel: Mutex::new(None),
        }
    }

    /// Remove the handler.
    pub fn unsubscribe(&self) {
        let cancel = self.cancel.lock().take();
        if let Some(cancel) = cancel {
            cancel();
        }
    }

    /// Whether the handler is still registered through this handle.
    pub fn is_active(&self) -> bool {
        self.cancel.lock().is_some()
    }
}

impl fmt::Debug for EventSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSubscription")
            .field("active", &self.is_active())
            .finish()
    }
}

struct Registration {
    id: u64,
    event: HostEvent,
    handler: EventHandler,
}

#[derive(Default)]
struct Registrations {
    next_id: u64,
    entries: Vec<Registration>,
}

/// In-process [`EventProxy`] that dispatches events handed to it.
///
/// Handlers for one event run in registration order. Cloning the proxy
/// shares the handler list.
#[derive(Clone, Default)]
pub struct LocalEventProxy {
    inner: Arc<Mutex<Registrations>>,
}

impl LocalEventProxy {
    /// Create a proxy with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to every handler registered for it.
    ///
    /// Returns the number of handlers invoked. Handlers run without the
    /// internal lock held.
    pub fn dispatch(&self, event: HostEvent, payload: &Value) -> usize {
        let handlers: Vec<EventHandler> = self
            .inner
            .lock()
            .entries
            .iter()
            .filter(|r| r.event == event)
            .map(|r| r.handler.clone())
            .collect();
        tracing::trace!(target: targets::EVENT, %event, handlers = handlers.len(), "dispatching host event");
        for handler in &handlers {
            handler(payload);
        }
        handlers.len()
    }

    /// Number of handlers registered for `event`.
    pub fn handler_count(&self, event: HostEvent) -> usize {
        self.inner
            .lock()
            .entries
            .iter()
            .filter(|r| r.event == event)
            .count()
    }
}

impl EventProxy for LocalEventProxy {
    fn handle_event(&self, event: HostEvent, handler: EventHandler) -> EventSubscription {
        let id = {
            let mut inner = self.inner.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.entries.push(Registration { id, event, handler });
            id
        };
        tracing::trace!(target: targets::EVENT, %event, id, "registered host event handler");

        let weak = Arc::downgrade(&self.inner);
        EventSubscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.lock().entries.retain(|r| r.id != id);
            }
        })
    }
}

impl fmt::Debug for LocalEventProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalEventProxy")
            .field("handlers", &self.inner.lock().entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_round_trip() {
        for event in [
            HostEvent::OnLoad,
            HostEvent::OnShow,
            HostEvent::OnHide,
            HostEvent::OnReady,
            HostEvent::OnUnload,
        ] {
            assert_eq!(HostEvent::from_name(event.as_str()), Some(event));
        }
        assert_eq!(HostEvent::from_name("onTap"), None);
    }

    #[test]
    fn test_dispatch_only_matching_event() {
        let proxy = LocalEventProxy::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        let r = received.clone();
        proxy.handle_event(
            HostEvent::OnShow,
            Arc::new(move |v: &Value| r.lock().push(v.clone())),
        );

        assert_eq!(proxy.dispatch(HostEvent::OnHide, &Value::Null), 0);
        assert_eq!(proxy.dispatch(HostEvent::OnShow, &Value::from(1)), 1);
        assert_eq!(*received.lock(), vec![Value::from(1)]);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let proxy = LocalEventProxy::new();
        let sub = proxy.handle_event(HostEvent::OnLoad, Arc::new(|_: &Value| {}));
        assert_eq!(proxy.handler_count(HostEvent::OnLoad), 1);
        assert!(sub.is_active());

        sub.unsubscribe();
        sub.unsubscribe();
        assert!(!sub.is_active());
        assert_eq!(proxy.handler_count(HostEvent::OnLoad), 0);
    }

    #[test]
    fn test_handler_may_register_during_dispatch() {
        let proxy = LocalEventProxy::new();
        let inner = proxy.clone();
        proxy.handle_event(
            HostEvent::OnReady,
            Arc::new(move |_: &Value| {
                inner.handle_event(HostEvent::OnReady, Arc::new(|_: &Value| {}));
            }),
        );

        assert_eq!(proxy.dispatch(HostEvent::OnReady, &Value::Null), 1);
        assert_eq!(proxy.handler_count(HostEvent::OnReady), 2);
    }
}
