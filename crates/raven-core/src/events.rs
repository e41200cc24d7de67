//! Notification event model
//!
//! Typed representation of everything the server-push pipeline can
//! deliver: structured MAIL and CHAT events plus the legacy plaintext
//! mail line. Whether an event is *actionable* for a given viewer is
//! decided here, in one place: the session must match, and the target
//! set (when present) must contain the viewer.

use crate::identifiers::{SessionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Payload of a structured MAIL event
///
/// The backend broadcasts this on every send: just enough for the
/// client to raise its unread counter and show a preview line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailNotice {
    /// Mail identifier
    #[serde(default)]
    pub id: String,
    /// Subject line
    pub subject: String,
    /// Sending user
    pub sender_id: UserId,
}

/// A single chat message between two users
///
/// Belongs to exactly one conversation, keyed by the peer id relative
/// to the viewer (see [`ChatMessage::peer_for`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message identifier
    #[serde(default)]
    pub id: String,
    /// Session the message belongs to
    #[serde(default)]
    pub session_id: SessionId,
    /// Sending user
    pub sender_id: UserId,
    /// Receiving user
    pub receiver_id: UserId,
    /// Message body
    pub content: String,
    /// Server-side creation time
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// The conversation key for this message from `viewer`'s side:
    /// the other participant.
    pub fn peer_for(&self, viewer: &UserId) -> &UserId {
        if &self.sender_id == viewer {
            &self.receiver_id
        } else {
            &self.sender_id
        }
    }
}

/// A parsed inbound notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    /// Structured mail notification
    Mail {
        /// Session the mail belongs to
        session_id: SessionId,
        /// Targeted recipients; `None` means broadcast
        targets: Option<Vec<UserId>>,
        /// Mail preview payload
        notice: MailNotice,
    },
    /// Structured chat notification
    Chat {
        /// Session the message belongs to
        session_id: SessionId,
        /// Targeted recipients; `None` means broadcast
        targets: Option<Vec<UserId>>,
        /// The delivered message
        message: ChatMessage,
    },
    /// Legacy plaintext mail line (`NEW_MAIL:<session>:<csv targets>`)
    LegacyMail {
        /// Session the mail belongs to
        session_id: SessionId,
        /// Targeted recipients
        targets: Vec<UserId>,
    },
}

impl NotificationEvent {
    /// Session this event is scoped to
    pub fn session_id(&self) -> &SessionId {
        match self {
            Self::Mail { session_id, .. }
            | Self::Chat { session_id, .. }
            | Self::LegacyMail { session_id, .. } => session_id,
        }
    }

    /// Target set, if the event is targeted rather than broadcast
    pub fn targets(&self) -> Option<&[UserId]> {
        match self {
            Self::Mail { targets, .. } | Self::Chat { targets, .. } => targets.as_deref(),
            Self::LegacyMail { targets, .. } => Some(targets.as_slice()),
        }
    }

    /// Whether this event applies to the given viewer in the given session.
    ///
    /// An event is actionable iff its session matches the viewer's
    /// active session and its target set is absent or contains the
    /// viewer. A session mismatch is never actionable, regardless of
    /// targets.
    pub fn is_actionable_for(&self, viewer: &UserId, session: &SessionId) -> bool {
        if self.session_id() != session {
            return false;
        }
        match self.targets() {
            None => true,
            Some(targets) => targets.contains(viewer),
        }
    }
}

/// Authoritative per-user unread snapshot fetched from the server
///
/// Field names follow the backend's summary endpoint. Absent fields
/// leave the corresponding local counters untouched when applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadSummary {
    /// Unread mail count, when reported
    #[serde(default)]
    pub unread_mail_count: Option<u32>,
    /// Per-peer unread chat counts, when reported
    #[serde(default)]
    pub im_unread_counts: Option<HashMap<UserId, u32>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat(session: &str, targets: Option<Vec<&str>>) -> NotificationEvent {
        NotificationEvent::Chat {
            session_id: SessionId::new(session),
            targets: targets.map(|t| t.into_iter().map(UserId::from).collect()),
            message: ChatMessage {
                id: "m1".to_string(),
                session_id: SessionId::new(session),
                sender_id: UserId::new("u2"),
                receiver_id: UserId::new("u1"),
                content: "hi".to_string(),
                created_at: Utc::now(),
            },
        }
    }

    #[test]
    fn session_mismatch_is_never_actionable() {
        let event = chat("other", Some(vec!["u1"]));
        assert!(!event.is_actionable_for(&UserId::new("u1"), &SessionId::default()));
    }

    #[test]
    fn broadcast_event_is_actionable_for_anyone_in_session() {
        let event = chat("default", None);
        assert!(event.is_actionable_for(&UserId::new("u9"), &SessionId::default()));
    }

    #[test]
    fn targeted_event_requires_membership() {
        let event = chat("default", Some(vec!["u1", "u3"]));
        assert!(event.is_actionable_for(&UserId::new("u1"), &SessionId::default()));
        assert!(!event.is_actionable_for(&UserId::new("u2"), &SessionId::default()));
    }

    #[test]
    fn peer_is_the_other_participant() {
        let msg = ChatMessage {
            id: String::new(),
            session_id: SessionId::default(),
            sender_id: UserId::new("u2"),
            receiver_id: UserId::new("u1"),
            content: "hi".to_string(),
            created_at: Utc::now(),
        };
        assert_eq!(msg.peer_for(&UserId::new("u1")).as_str(), "u2");
        assert_eq!(msg.peer_for(&UserId::new("u2")).as_str(), "u1");
    }

    #[test]
    fn summary_deserializes_with_partial_fields() {
        let summary: UnreadSummary =
            serde_json::from_str(r#"{"unread_mail_count": 5}"#).unwrap();
        assert_eq!(summary.unread_mail_count, Some(5));
        assert!(summary.im_unread_counts.is_none());
    }

    #[test]
    fn chat_message_tolerates_minimal_wire_payload() {
        let msg: ChatMessage = serde_json::from_str(
            r#"{"sender_id":"u2","receiver_id":"u1","content":"hi"}"#,
        )
        .unwrap();
        assert_eq!(msg.sender_id.as_str(), "u2");
        assert!(msg.id.is_empty());
    }
}
