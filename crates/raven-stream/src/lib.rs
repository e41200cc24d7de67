//! Raven Stream - the server-push notification pipeline
//!
//! A long-lived inbound event stream scoped to the active identity and
//! session. Frames are parsed in two explicit stages (structured JSON,
//! then the legacy plaintext mail line), filtered for actionability
//! against the live [`raven_state::IdentityContext`], and fanned out as
//! typed [`StreamEvent`]s. The connection survives transport loss via
//! an unbounded fixed-delay reconnect.

#![forbid(unsafe_code)]

/// Two-stage wire parser
pub mod parser;

/// Transport abstraction over the raw frame stream
pub mod transport;

/// Connection state machine and event fan-out
pub mod stream;

/// Scripted transport for tests
pub mod testing;

pub use parser::{parse_event, ParseOutcome};
pub use stream::{NotificationStream, StreamEvent, StreamState, RECONNECT_DELAY};
pub use transport::{EventTransport, FrameStream};
