//! Host-injected capabilities
//!
//! The child core never talks to a backend directly; the host (or the
//! standalone bootstrap) injects implementations of these traits at
//! mount. A capability the host chose not to bind surfaces as
//! [`RavenError::CapabilityNotBound`] at the call site, never as a
//! panic.
//!
//! [`RavenError::CapabilityNotBound`]: raven_core::RavenError

use async_trait::async_trait;
use raven_core::{DirectoryEntry, RavenError, SessionId, UnreadSummary, UserId};

/// Looks up users in the shared directory
#[async_trait]
pub trait DirectoryProvider: Send + Sync {
    /// Fetch directory entries matching `query`, unfiltered.
    ///
    /// Visibility filtering is applied by the caller; implementations
    /// return everything the backend knows.
    async fn fetch_users(&self, query: &str) -> Result<Vec<DirectoryEntry>, RavenError>;
}

/// Fetches the authoritative unread summary for a user
#[async_trait]
pub trait SummarySource: Send + Sync {
    /// Fetch the server-side unread snapshot for `user` in `session`
    async fn fetch_summary(
        &self,
        session: &SessionId,
        user: &UserId,
    ) -> Result<UnreadSummary, RavenError>;
}
