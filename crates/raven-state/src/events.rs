//! Same-process typed event bus
//!
//! The in-page counterpart of the upstream state channel: components in
//! the same process (widgets, badges, the host shell page itself)
//! subscribe here for the `raven-*` events the child emits. Delivery is
//! best-effort; a missing or lagged receiver never fails the sender.

use raven_core::{ChatMessage, MailNotice, UserId};
use tokio::sync::broadcast;
use tracing::trace;

const BUS_CAPACITY: usize = 64;

/// A typed local event, named after its legacy DOM event
#[derive(Debug, Clone)]
pub enum LocalEvent {
    /// `raven-new-mail`: the unread count changed
    NewMail {
        /// New aggregate unread count
        unread_count: u32,
        /// User the count belongs to
        user_id: UserId,
    },
    /// `raven-mail-updated`: a mail notification arrived
    MailUpdated {
        /// The mail preview payload
        notice: MailNotice,
    },
    /// `raven-im-received`: a chat message arrived
    ImReceived {
        /// The delivered message
        message: ChatMessage,
    },
}

impl LocalEvent {
    /// The legacy event name this variant corresponds to
    pub fn name(&self) -> &'static str {
        match self {
            Self::NewMail { .. } => "raven-new-mail",
            Self::MailUpdated { .. } => "raven-mail-updated",
            Self::ImReceived { .. } => "raven-im-received",
        }
    }
}

/// Broadcast bus for [`LocalEvent`]s within one process
#[derive(Clone)]
pub struct LocalEventBus {
    tx: broadcast::Sender<LocalEvent>,
}

impl LocalEventBus {
    /// Create a bus with the default capacity
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }

    /// Emit an event to all current subscribers.
    ///
    /// Never fails: with no receivers the event is simply dropped.
    pub fn emit(&self, event: LocalEvent) {
        trace!(event = event.name(), "local event emitted");
        let _ = self.tx.send(event);
    }

    /// Subscribe to future events
    pub fn subscribe(&self) -> broadcast::Receiver<LocalEvent> {
        self.tx.subscribe()
    }
}

impl Default for LocalEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_match_the_legacy_contract() {
        let event = LocalEvent::NewMail {
            unread_count: 1,
            user_id: UserId::new("u1"),
        };
        assert_eq!(event.name(), "raven-new-mail");
    }

    #[tokio::test]
    async fn emit_without_subscribers_does_not_fail() {
        let bus = LocalEventBus::new();
        bus.emit(LocalEvent::NewMail {
            unread_count: 1,
            user_id: UserId::new("u1"),
        });
    }

    #[tokio::test]
    async fn subscribers_receive_emitted_events() {
        let bus = LocalEventBus::new();
        let mut rx = bus.subscribe();
        bus.emit(LocalEvent::NewMail {
            unread_count: 2,
            user_id: UserId::new("u1"),
        });

        match rx.recv().await {
            Ok(LocalEvent::NewMail { unread_count, .. }) => assert_eq!(unread_count, 2),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
