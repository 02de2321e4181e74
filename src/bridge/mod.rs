//! Restricted channel-messaging surface for sandboxed callers
//!
//! A narrow, named-channel event bus: fire-and-forget sends, durable and
//! one-shot subscriptions, and token-based teardown. The bridge knows
//! nothing about channel names or payload shapes; rejecting a malformed
//! payload is the receiving handler's problem. Sending on a channel nobody
//! listens to is a silent no-op.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::trace;

type Handler = Box<dyn FnMut(&Value) + Send>;

struct Registration {
    id: u64,
    once: bool,
    handler: Handler,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    channels: HashMap<String, Vec<Registration>>,
    /// Ids of registrations checked out for an in-flight delivery
    checked_out: HashSet<u64>,
    /// Checked-out ids unsubscribed before their delivery finished
    retired: HashSet<u64>,
}

/// Opaque capability identifying one registration.
///
/// Removal goes through this token, never through reference equality on
/// the handler: registering the same closure twice yields two independent
/// subscriptions, each with its own token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subscription {
    channel: String,
    id: u64,
}

impl Subscription {
    pub fn channel(&self) -> &str {
        &self.channel
    }
}

/// In-process channel bus exposed to the sandboxed UI layer.
#[derive(Default)]
pub struct IpcBridge {
    registry: Mutex<Registry>,
}

impl IpcBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for every future message on `channel`, in
    /// registration order relative to other subscribers.
    pub fn on(
        &self,
        channel: &str,
        handler: impl FnMut(&Value) + Send + 'static,
    ) -> Subscription {
        self.register(channel, Box::new(handler), false)
    }

    /// Like [`on`](Self::on), but the registration removes itself after
    /// exactly one delivery. If no message ever arrives it persists until
    /// the bridge is dropped.
    pub fn once(
        &self,
        channel: &str,
        handler: impl FnMut(&Value) + Send + 'static,
    ) -> Subscription {
        self.register(channel, Box::new(handler), true)
    }

    fn register(&self, channel: &str, handler: Handler, once: bool) -> Subscription {
        let mut registry = self.registry.lock();
        registry.next_id += 1;
        let id = registry.next_id;
        registry
            .channels
            .entry(channel.to_string())
            .or_default()
            .push(Registration { id, once, handler });
        trace!(channel, id, once, "subscription registered");
        Subscription {
            channel: channel.to_string(),
            id,
        }
    }

    /// Deregister exactly the registration behind `subscription`. Other
    /// subscribers on the same channel are unaffected; a stale or unknown
    /// token is a no-op. After this returns the handler will not be
    /// invoked again, even for a delivery already in flight.
    pub fn remove_listener(&self, subscription: &Subscription) {
        let mut registry = self.registry.lock();
        let mut found = false;
        if let Some(list) = registry.channels.get_mut(&subscription.channel) {
            let before = list.len();
            list.retain(|r| r.id != subscription.id);
            found = list.len() != before;
            if list.is_empty() {
                registry.channels.remove(&subscription.channel);
            }
        }
        if !found && registry.checked_out.contains(&subscription.id) {
            // The registration is checked out by an in-flight send; leave a
            // tombstone so it neither fires again nor survives the merge.
            // A stale token (already consumed or removed) matches neither
            // branch and leaves no trace.
            registry.retired.insert(subscription.id);
        }
        trace!(
            channel = %subscription.channel,
            id = subscription.id,
            found,
            "subscription removed"
        );
    }

    /// Consume the capability returned by `on`/`once`
    pub fn unsubscribe(&self, subscription: Subscription) {
        self.remove_listener(&subscription);
    }

    /// Deliver `payload` to every current subscriber of `channel`, in
    /// registration order. Fire-and-forget: no acknowledgment, no error,
    /// and no effect when nobody listens.
    pub fn send(&self, channel: &str, payload: &Value) {
        let mut taken = {
            let mut registry = self.registry.lock();
            match registry.channels.remove(channel) {
                Some(list) => {
                    for registration in &list {
                        registry.checked_out.insert(registration.id);
                    }
                    list
                }
                None => return,
            }
        };
        let taken_ids: Vec<u64> = taken.iter().map(|r| r.id).collect();

        // Handlers run with the lock released so they may call back into
        // the bridge; unsubscribes landing mid-delivery show up as
        // tombstones checked before each invocation.
        let mut survivors = Vec::with_capacity(taken.len());
        for mut registration in taken.drain(..) {
            if self.registry.lock().retired.contains(&registration.id) {
                continue;
            }
            (registration.handler)(payload);
            if !registration.once {
                survivors.push(registration);
            }
        }

        let mut registry = self.registry.lock();
        survivors.retain(|r| !registry.retired.contains(&r.id));
        for id in taken_ids {
            registry.checked_out.remove(&id);
            registry.retired.remove(&id);
        }

        // Subscriptions added during delivery landed in a fresh list; they
        // go after the survivors to keep registration order.
        let list = registry.channels.entry(channel.to_string()).or_default();
        let added = std::mem::take(list);
        *list = survivors;
        list.extend(added);
        if list.is_empty() {
            registry.channels.remove(channel);
        }
    }
}
