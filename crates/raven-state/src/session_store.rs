//! Durable session slot
//!
//! The active session id survives reloads through a small key-value
//! slot. Hosts with real persistence implement [`SessionStore`]; the
//! in-memory store covers standalone runs and tests.

use parking_lot::Mutex;
use raven_core::{RavenError, SessionId};

/// Durable storage for the active session id
pub trait SessionStore: Send + Sync {
    /// Load the persisted session, if any
    fn load(&self) -> Result<Option<SessionId>, RavenError>;

    /// Persist the active session
    fn store(&self, session_id: &SessionId) -> Result<(), RavenError>;
}

/// Process-local session slot with no persistence across restarts
#[derive(Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<SessionId>>,
}

impl MemorySessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<SessionId>, RavenError> {
        Ok(self.slot.lock().clone())
    }

    fn store(&self, session_id: &SessionId) -> Result<(), RavenError> {
        *self.slot.lock() = Some(session_id.clone());
        Ok(())
    }
}
