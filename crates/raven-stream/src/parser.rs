//! Two-stage wire parser
//!
//! Stage one attempts the structured JSON tagged union the backend
//! broadcasts; stage two falls back to the legacy plaintext mail line
//! (`NEW_MAIL:<sessionId>:<csv targetIds>`). Anything else is
//! [`ParseOutcome::Unrecognized`] — treated as an unrecognized
//! heartbeat, not an error. Both stages are plain typed returns so the
//! fallback path is testable independent of the primary path.

use raven_core::{ChatMessage, MailNotice, NotificationEvent, SessionId, UserId};
use serde::Deserialize;

const LEGACY_MAIL_PREFIX: &str = "NEW_MAIL:";

/// Result of parsing one raw inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// A structured or legacy notification
    Parsed(NotificationEvent),
    /// Not a notification; discard silently
    Unrecognized,
}

/// Wire shape of the structured JSON events
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum WireEvent {
    #[serde(rename = "MAIL")]
    Mail {
        session_id: SessionId,
        #[serde(default)]
        targets: Option<Vec<UserId>>,
        data: MailNotice,
    },
    #[serde(rename = "CHAT")]
    Chat {
        session_id: SessionId,
        #[serde(default)]
        targets: Option<Vec<UserId>>,
        data: ChatMessage,
    },
}

impl From<WireEvent> for NotificationEvent {
    fn from(wire: WireEvent) -> Self {
        match wire {
            WireEvent::Mail {
                session_id,
                targets,
                data,
            } => NotificationEvent::Mail {
                session_id,
                targets,
                notice: data,
            },
            WireEvent::Chat {
                session_id,
                targets,
                data,
            } => NotificationEvent::Chat {
                session_id,
                targets,
                message: data,
            },
        }
    }
}

/// Parse one raw frame into a typed outcome.
pub fn parse_event(raw: &str) -> ParseOutcome {
    let raw = raw.trim();
    if raw.is_empty() {
        return ParseOutcome::Unrecognized;
    }
    if let Ok(wire) = serde_json::from_str::<WireEvent>(raw) {
        return ParseOutcome::Parsed(wire.into());
    }
    parse_legacy(raw)
}

/// Stage two: the colon-delimited plaintext mail line.
fn parse_legacy(raw: &str) -> ParseOutcome {
    let Some(rest) = raw.strip_prefix(LEGACY_MAIL_PREFIX) else {
        return ParseOutcome::Unrecognized;
    };
    let Some((session, csv)) = rest.split_once(':') else {
        return ParseOutcome::Unrecognized;
    };
    if session.is_empty() {
        return ParseOutcome::Unrecognized;
    }
    let targets: Vec<UserId> = csv
        .split(',')
        .filter(|id| !id.is_empty())
        .map(UserId::from)
        .collect();

    ParseOutcome::Parsed(NotificationEvent::LegacyMail {
        session_id: SessionId::new(session),
        targets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parses_structured_mail_event() {
        let raw = r#"{"type":"MAIL","session_id":"default","targets":["u1","u2"],"data":{"id":"m-1","subject":"hello","sender_id":"u3"}}"#;
        let outcome = parse_event(raw);
        assert_matches!(
            outcome,
            ParseOutcome::Parsed(NotificationEvent::Mail { session_id, targets, notice }) => {
                assert_eq!(session_id.as_str(), "default");
                assert_eq!(targets.unwrap().len(), 2);
                assert_eq!(notice.subject, "hello");
            }
        );
    }

    #[test]
    fn parses_structured_chat_event() {
        let raw = r#"{"type":"CHAT","session_id":"default","targets":["u1"],"data":{"sender_id":"u2","receiver_id":"u1","content":"hi"}}"#;
        assert_matches!(
            parse_event(raw),
            ParseOutcome::Parsed(NotificationEvent::Chat { message, .. }) => {
                assert_eq!(message.sender_id.as_str(), "u2");
                assert_eq!(message.content, "hi");
            }
        );
    }

    #[test]
    fn structured_event_without_targets_is_broadcast() {
        let raw = r#"{"type":"MAIL","session_id":"s1","data":{"subject":"x","sender_id":"u1"}}"#;
        assert_matches!(
            parse_event(raw),
            ParseOutcome::Parsed(NotificationEvent::Mail { targets: None, .. })
        );
    }

    #[test]
    fn parses_legacy_mail_line() {
        assert_matches!(
            parse_event("NEW_MAIL:default:u1,u2"),
            ParseOutcome::Parsed(NotificationEvent::LegacyMail { session_id, targets }) => {
                assert_eq!(session_id.as_str(), "default");
                assert_eq!(targets, vec![UserId::new("u1"), UserId::new("u2")]);
            }
        );
    }

    #[test]
    fn legacy_line_tolerates_trailing_commas() {
        assert_matches!(
            parse_event("NEW_MAIL:s1:u1,"),
            ParseOutcome::Parsed(NotificationEvent::LegacyMail { targets, .. }) => {
                assert_eq!(targets.len(), 1);
            }
        );
    }

    #[test]
    fn malformed_frames_are_unrecognized() {
        assert_eq!(parse_event(""), ParseOutcome::Unrecognized);
        assert_eq!(parse_event("ping"), ParseOutcome::Unrecognized);
        assert_eq!(parse_event("{\"type\":\"OTHER\"}"), ParseOutcome::Unrecognized);
        assert_eq!(parse_event("NEW_MAIL:"), ParseOutcome::Unrecognized);
        assert_eq!(parse_event("NEW_MAIL::u1"), ParseOutcome::Unrecognized);
    }

    #[test]
    fn unknown_json_type_falls_through_to_unrecognized() {
        // Valid JSON, wrong tag: neither stage claims it.
        assert_eq!(
            parse_event(r#"{"type":"PRESENCE","session_id":"s1"}"#),
            ParseOutcome::Unrecognized
        );
    }
}
