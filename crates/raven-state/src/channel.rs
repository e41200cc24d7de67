//! Ordered pub/sub channel over global-state patches
//!
//! One channel instance is owned by the host and handed to every child
//! at mount. Patches merge through a single serialization point, so
//! every subscriber observes them in the exact `set_state` call order.
//! A failing subscriber is logged and isolated; it never blocks
//! delivery to the subscribers registered after it.

use crate::state::{GlobalState, StatePatch};
use parking_lot::Mutex;
use raven_core::RavenError;
use std::sync::{Arc, Weak};
use tracing::{debug, warn};
use uuid::Uuid;

/// Subscriber callback: receives `(new_state, previous_state)`.
///
/// Returning `Err` reports a subscriber-local failure; the channel logs
/// it and continues with the remaining subscribers.
pub type StateCallback =
    dyn Fn(&GlobalState, &GlobalState) -> Result<(), RavenError> + Send + Sync;

struct Subscriber {
    id: Uuid,
    callback: Arc<StateCallback>,
}

struct ChannelInner {
    /// Serializes merge+notify so patch order equals delivery order.
    delivery: Mutex<()>,
    state: Mutex<GlobalState>,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl ChannelInner {
    fn notify(&self, new_state: &GlobalState, previous: &GlobalState) {
        let snapshot: Vec<(Uuid, Arc<StateCallback>)> = {
            let subscribers = self.subscribers.lock();
            subscribers
                .iter()
                .map(|s| (s.id, Arc::clone(&s.callback)))
                .collect()
        };
        for (id, callback) in snapshot {
            if let Err(error) = callback(new_state, previous) {
                warn!(subscriber = %id, %error, "state subscriber failed; continuing");
            }
        }
    }
}

/// Bidirectional host/child state bridge
///
/// Cheap to clone; all clones share the same state and subscriber list.
#[derive(Clone)]
pub struct GlobalStateChannel {
    inner: Arc<ChannelInner>,
}

impl GlobalStateChannel {
    /// Create a channel seeded with the given initial state
    pub fn new(initial: GlobalState) -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                delivery: Mutex::new(()),
                state: Mutex::new(initial),
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Merge a patch into the shared state and notify subscribers.
    ///
    /// Returns `false` without notifying anyone if the patch is empty
    /// or shallow-equal to the current state; otherwise every
    /// subscriber is called synchronously, in registration order, with
    /// `(new_state, previous_state)`.
    ///
    /// Callbacks must not call back into `set_state` synchronously.
    pub fn set_state(&self, patch: StatePatch) -> bool {
        if patch.is_empty() {
            return false;
        }

        let _ordering = self.inner.delivery.lock();

        let (previous, new_state) = {
            let mut state = self.inner.state.lock();
            let previous = state.clone();
            if !patch.apply(&mut state) {
                debug!("no-op state patch suppressed");
                return false;
            }
            (previous, state.clone())
        };

        self.inner.notify(&new_state, &previous);
        true
    }

    /// Register a subscriber.
    ///
    /// With `fire_immediately` the callback is invoked once
    /// synchronously with `(current, current)` before this returns.
    /// The returned [`Subscription`] unsubscribes on drop.
    pub fn subscribe(
        &self,
        callback: impl Fn(&GlobalState, &GlobalState) -> Result<(), RavenError>
            + Send
            + Sync
            + 'static,
    ) -> Subscription {
        self.subscribe_with(callback, false)
    }

    /// Register a subscriber, optionally firing it immediately.
    pub fn subscribe_with(
        &self,
        callback: impl Fn(&GlobalState, &GlobalState) -> Result<(), RavenError>
            + Send
            + Sync
            + 'static,
        fire_immediately: bool,
    ) -> Subscription {
        let id = Uuid::new_v4();
        let callback: Arc<StateCallback> = Arc::new(callback);

        // Hold the ordering lock across registration and the immediate
        // fire so no patch can interleave between the two.
        let _ordering = self.inner.delivery.lock();
        self.inner
            .subscribers
            .lock()
            .push(Subscriber {
                id,
                callback: Arc::clone(&callback),
            });

        if fire_immediately {
            let current = self.inner.state.lock().clone();
            if let Err(error) = callback(&current, &current) {
                warn!(subscriber = %id, %error, "immediate state callback failed");
            }
        }

        Subscription {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Current state snapshot
    pub fn snapshot(&self) -> GlobalState {
        self.inner.state.lock().clone()
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }
}

impl Default for GlobalStateChannel {
    fn default() -> Self {
        Self::new(GlobalState::default())
    }
}

/// RAII subscription guard; dropping it unsubscribes.
pub struct Subscription {
    id: Uuid,
    inner: Weak<ChannelInner>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.subscribers.lock().retain(|s| s.id != self.id);
        }
    }
}
