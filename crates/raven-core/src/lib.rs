//! Raven Core - shared domain types for the synchronization core
//!
//! This crate carries the types every other Raven crate speaks in:
//! identifier newtypes, the authenticated identity and its faction role,
//! the cross-faction visibility policy, the notification event model of
//! the server-push pipeline, and the unified error type.
//!
//! It contains no I/O and no application logic; everything here is a
//! value type or a pure function.

#![forbid(unsafe_code)]

/// User and session identifier newtypes
pub mod identifiers;

/// Authenticated identity, faction roles, and directory entries
pub mod identity;

/// Cross-faction visibility policy
pub mod visibility;

/// Notification event model and payloads
pub mod events;

/// Unified error handling
pub mod errors;

pub use errors::RavenError;
pub use events::{ChatMessage, MailNotice, NotificationEvent, UnreadSummary};
pub use identifiers::{SessionId, UserId};
pub use identity::{DirectoryEntry, Identity, Role};
pub use visibility::{filter_directory, visible};
