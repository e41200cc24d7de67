//! Per-channel unread accounting
//!
//! One counter for mail, one counter per chat peer, and a derived chat
//! total that is always recomputed from scratch rather than adjusted
//! incrementally. Server summaries are authoritative and overwrite the
//! local counters wholesale for every field they carry.

use raven_core::{ChatMessage, UnreadSummary, UserId};
use std::collections::HashMap;
use tracing::debug;

/// Snapshot of the aggregated unread counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnreadState {
    /// Unread mail notifications
    pub mail_unread: u32,
    /// Unread chat messages keyed by conversation peer
    pub chat_unread_by_peer: HashMap<UserId, u32>,
    /// Sum of all per-peer chat counters
    pub total_chat_unread: u32,
}

impl UnreadState {
    /// Mail plus chat, the single number published to the host
    pub fn combined(&self) -> u32 {
        self.mail_unread.saturating_add(self.total_chat_unread)
    }
}

/// Maintains unread counters and conversation history for one viewer
pub struct UnreadAggregator {
    viewer: UserId,
    state: UnreadState,
    conversations: HashMap<UserId, Vec<ChatMessage>>,
}

impl UnreadAggregator {
    /// Create an aggregator with zeroed counters for `viewer`
    pub fn new(viewer: UserId) -> Self {
        Self {
            viewer,
            state: UnreadState::default(),
            conversations: HashMap::new(),
        }
    }

    /// The viewer the counters belong to
    pub fn viewer(&self) -> &UserId {
        &self.viewer
    }

    /// Discard all counters and history and start over for a new
    /// viewer. Used when the active user is replaced; the next summary
    /// fetch repopulates the counters.
    pub fn reset_for(&mut self, viewer: UserId) {
        debug!(viewer = %viewer, "unread counters reset for new viewer");
        self.viewer = viewer;
        self.state = UnreadState::default();
        self.conversations.clear();
    }

    /// Record one inbound mail notification. Returns the new combined
    /// unread count.
    pub fn on_mail_event(&mut self) -> u32 {
        self.state.mail_unread = self.state.mail_unread.saturating_add(1);
        self.state.combined()
    }

    /// Record an inbound chat message.
    ///
    /// The message is appended to its conversation either way; the
    /// peer's unread counter rises only when someone else sent it.
    /// Returns the new combined unread count.
    pub fn on_chat_event(&mut self, message: ChatMessage) -> u32 {
        let peer = message.peer_for(&self.viewer).clone();
        let own = message.sender_id == self.viewer;

        self.conversations.entry(peer.clone()).or_default().push(message);
        if !own {
            let counter = self.state.chat_unread_by_peer.entry(peer).or_insert(0);
            *counter = counter.saturating_add(1);
            self.recompute_total();
        }
        self.state.combined()
    }

    /// Mark the conversation with `peer` as read.
    ///
    /// Idempotent, and never touches the mail counter. Returns the new
    /// combined unread count.
    pub fn mark_read(&mut self, peer: &UserId) -> u32 {
        if let Some(count) = self.state.chat_unread_by_peer.get_mut(peer) {
            *count = 0;
            self.recompute_total();
        }
        self.state.combined()
    }

    /// Overwrite local counters with an authoritative server summary.
    ///
    /// Each field present in the summary replaces the local value
    /// wholesale; absent fields leave local state untouched. Returns
    /// the new combined unread count.
    pub fn apply_summary(&mut self, summary: &UnreadSummary) -> u32 {
        if let Some(mail) = summary.unread_mail_count {
            self.state.mail_unread = mail;
        }
        if let Some(counts) = &summary.im_unread_counts {
            self.state.chat_unread_by_peer = counts.clone();
            self.recompute_total();
        }
        debug!(
            mail = self.state.mail_unread,
            chat = self.state.total_chat_unread,
            "server summary applied"
        );
        self.state.combined()
    }

    /// Current counters
    pub fn snapshot(&self) -> UnreadState {
        self.state.clone()
    }

    /// Messages exchanged with `peer`, in arrival order
    pub fn conversation(&self, peer: &UserId) -> &[ChatMessage] {
        self.conversations.get(peer).map(Vec::as_slice).unwrap_or(&[])
    }

    fn recompute_total(&mut self) {
        // Deliberately re-derived from the map every time; the total
        // can never drift from the per-peer counters.
        self.state.total_chat_unread = self.state.chat_unread_by_peer.values().sum();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use raven_core::SessionId;

    fn msg(sender: &str, receiver: &str) -> ChatMessage {
        ChatMessage {
            id: String::new(),
            session_id: SessionId::default(),
            sender_id: UserId::new(sender),
            receiver_id: UserId::new(receiver),
            content: "hi".to_string(),
            created_at: Utc::now(),
        }
    }

    fn aggregator() -> UnreadAggregator {
        UnreadAggregator::new(UserId::new("u1"))
    }

    #[test]
    fn total_always_equals_sum_of_peer_counters() {
        let mut agg = aggregator();
        agg.on_chat_event(msg("u2", "u1"));
        agg.on_chat_event(msg("u3", "u1"));
        agg.on_chat_event(msg("u2", "u1"));
        agg.mark_read(&UserId::new("u3"));
        agg.on_chat_event(msg("u4", "u1"));

        let state = agg.snapshot();
        let sum: u32 = state.chat_unread_by_peer.values().sum();
        assert_eq!(state.total_chat_unread, sum);
        assert_eq!(state.total_chat_unread, 3);
    }

    #[test]
    fn own_messages_extend_history_without_counting() {
        let mut agg = aggregator();
        agg.on_chat_event(msg("u1", "u2"));

        assert_eq!(agg.snapshot().total_chat_unread, 0);
        assert_eq!(agg.conversation(&UserId::new("u2")).len(), 1);
    }

    #[test]
    fn conversations_are_keyed_by_peer_both_directions() {
        let mut agg = aggregator();
        agg.on_chat_event(msg("u2", "u1"));
        agg.on_chat_event(msg("u1", "u2"));

        assert_eq!(agg.conversation(&UserId::new("u2")).len(), 2);
        assert!(agg.conversation(&UserId::new("u1")).is_empty());
    }

    #[test]
    fn mark_read_is_idempotent_and_leaves_mail_alone() {
        let mut agg = aggregator();
        agg.on_mail_event();
        agg.on_chat_event(msg("u2", "u1"));

        assert_eq!(agg.mark_read(&UserId::new("u2")), 1);
        assert_eq!(agg.mark_read(&UserId::new("u2")), 1);
        assert_eq!(agg.mark_read(&UserId::new("nobody")), 1);

        let state = agg.snapshot();
        assert_eq!(state.mail_unread, 1);
        assert_eq!(state.chat_unread_by_peer.get(&UserId::new("u2")), Some(&0));
    }

    #[test]
    fn summary_overwrites_present_fields_wholesale() {
        let mut agg = aggregator();
        agg.on_mail_event();
        agg.on_chat_event(msg("u2", "u1"));
        agg.on_chat_event(msg("u3", "u1"));

        let counts = HashMap::from([(UserId::new("u9"), 7u32)]);
        let combined = agg.apply_summary(&UnreadSummary {
            unread_mail_count: Some(4),
            im_unread_counts: Some(counts),
        });

        let state = agg.snapshot();
        assert_eq!(combined, 11);
        assert_eq!(state.mail_unread, 4);
        // Local u2/u3 counters are gone, not merged.
        assert_eq!(state.chat_unread_by_peer.len(), 1);
        assert_eq!(state.total_chat_unread, 7);
    }

    #[test]
    fn partial_summary_leaves_absent_fields_untouched() {
        let mut agg = aggregator();
        agg.on_chat_event(msg("u2", "u1"));

        agg.apply_summary(&UnreadSummary {
            unread_mail_count: Some(9),
            im_unread_counts: None,
        });

        let state = agg.snapshot();
        assert_eq!(state.mail_unread, 9);
        assert_eq!(state.total_chat_unread, 1);
    }

    #[test]
    fn counters_saturate_instead_of_wrapping() {
        let mut agg = aggregator();
        agg.apply_summary(&UnreadSummary {
            unread_mail_count: Some(u32::MAX),
            im_unread_counts: Some(HashMap::from([(UserId::new("u2"), u32::MAX)])),
        });

        agg.on_mail_event();
        agg.on_chat_event(msg("u2", "u1"));

        let state = agg.snapshot();
        assert_eq!(state.mail_unread, u32::MAX);
        assert_eq!(state.chat_unread_by_peer.get(&UserId::new("u2")), Some(&u32::MAX));
        assert_eq!(state.combined(), u32::MAX);
    }

    #[test]
    fn reset_clears_counters_and_history() {
        let mut agg = aggregator();
        agg.on_mail_event();
        agg.on_chat_event(msg("u2", "u1"));

        agg.reset_for(UserId::new("u5"));
        assert_eq!(agg.snapshot(), UnreadState::default());
        assert!(agg.conversation(&UserId::new("u2")).is_empty());
        assert_eq!(agg.viewer().as_str(), "u5");
    }
}
