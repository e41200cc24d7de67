//! Transport abstraction over the raw frame stream
//!
//! The stream client never opens sockets itself; it asks an injected
//! [`EventTransport`] for a long-lived frame stream scoped to the
//! active session and viewer. Production hosts back this with their
//! server-push channel (SSE, websocket); tests script it.

use async_trait::async_trait;
use futures::stream::BoxStream;
use raven_core::{RavenError, SessionId, UserId};

/// A long-lived stream of raw inbound frames.
///
/// Yields `Err` on transport failure; ending (returning `None`) is
/// treated the same as a failure by the client.
pub type FrameStream = BoxStream<'static, Result<String, RavenError>>;

/// Capability that opens the inbound notification stream
#[async_trait]
pub trait EventTransport: Send + Sync {
    /// Open a frame stream scoped to `session` and, when known, the
    /// viewing user.
    async fn connect(
        &self,
        session: &SessionId,
        viewer: Option<&UserId>,
    ) -> Result<FrameStream, RavenError>;
}
