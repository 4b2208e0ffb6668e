//! Typed lifecycle hooks.
//!
//! Thin consumers of a [`LifecycleBus`] that unwrap the signal value for
//! application code. Each hook behaves like [`LifecycleBus::subscribe`]:
//! a value that was already emitted is delivered before the hook returns.

use crate::lifecycle::{LifecycleBus, LifecycleEvent, LifecycleName, LoadOptions, Subscription};

/// Receive the page launch options.
#[must_use = "the handle is the only way to unsubscribe"]
pub fn use_load_options<F>(bus: &LifecycleBus, callback: F) -> Subscription
where
    F: Fn(&LoadOptions) + Send + Sync + 'static,
{
    bus.subscribe(LifecycleName::LoadOptions, move |event| {
        if let LifecycleEvent::LoadOptions(options) = event {
            callback(options);
        }
    })
}

/// Receive page visibility changes.
#[must_use = "the handle is the only way to unsubscribe"]
pub fn use_visibility<F>(bus: &LifecycleBus, callback: F) -> Subscription
where
    F: Fn(bool) + Send + Sync + 'static,
{
    bus.subscribe(LifecycleName::Visibility, move |event| {
        if let LifecycleEvent::Visibility(visible) = event {
            callback(*visible);
        }
    })
}
