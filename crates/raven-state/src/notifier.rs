//! Outbound unread publication
//!
//! Whenever local unread state changes, the child re-publishes it both
//! ways: a local event for same-process listeners, and a state patch
//! upstream when a host channel is bound. Both sinks fire on every
//! call; one failing never suppresses the other.

use crate::binding::HostBinding;
use crate::events::{LocalEvent, LocalEventBus};
use crate::state::StatePatch;
use raven_core::UserId;
use std::sync::Arc;
use tracing::debug;

/// Publishes unread-count changes to the host and local listeners
pub struct HostNotifier {
    bus: LocalEventBus,
    binding: Arc<HostBinding>,
}

impl HostNotifier {
    /// Create a notifier over the given bus and binding
    pub fn new(bus: LocalEventBus, binding: Arc<HostBinding>) -> Self {
        Self { bus, binding }
    }

    /// Publish a new aggregate unread count for `user_id`.
    pub fn publish(&self, unread_count: u32, user_id: &UserId) {
        debug!(unread_count, user = %user_id, "publishing unread count");

        // Local listeners first; emit never fails.
        self.bus.emit(LocalEvent::NewMail {
            unread_count,
            user_id: user_id.clone(),
        });

        // Upstream, when a host is bound. A no-op result (unchanged
        // state or standalone) is fine.
        self.binding.publish(
            StatePatch::new()
                .with_unread_count(unread_count)
                .with_last_user(user_id.clone()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::GlobalStateChannel;

    #[tokio::test]
    async fn publish_feeds_both_sinks() {
        let channel = GlobalStateChannel::default();
        let bus = LocalEventBus::new();
        let mut rx = bus.subscribe();
        let notifier = HostNotifier::new(bus, Arc::new(HostBinding::embedded(channel.clone())));

        notifier.publish(4, &UserId::new("u1"));

        let state = channel.snapshot();
        assert_eq!(state.unread_count, 4);
        assert_eq!(state.last_user, Some(UserId::new("u1")));

        match rx.recv().await {
            Ok(LocalEvent::NewMail { unread_count, user_id }) => {
                assert_eq!(unread_count, 4);
                assert_eq!(user_id.as_str(), "u1");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn standalone_publish_still_emits_locally() {
        let bus = LocalEventBus::new();
        let mut rx = bus.subscribe();
        let notifier = HostNotifier::new(bus, Arc::new(HostBinding::Standalone));

        notifier.publish(1, &UserId::new("u1"));
        assert!(matches!(rx.recv().await, Ok(LocalEvent::NewMail { .. })));
    }
}
