//! Live identity and session context
//!
//! Pure value holder for the active user and session, shared by every
//! component through an `Arc`. Mutated only through validated setters,
//! invoked by the synchronization channel or explicit user action.

use parking_lot::RwLock;
use raven_core::{Identity, RavenError, Role, SessionId, UserId};
use tracing::info;

struct Inner {
    user: Option<Identity>,
    session_id: SessionId,
}

/// The active user and session for one child application instance
pub struct IdentityContext {
    inner: RwLock<Inner>,
}

impl IdentityContext {
    /// Create a context with no user yet, scoped to `session_id`
    pub fn new(session_id: SessionId) -> Self {
        Self {
            inner: RwLock::new(Inner {
                user: None,
                session_id,
            }),
        }
    }

    /// Replace the active user wholesale.
    ///
    /// Rejects identities with an empty id.
    pub fn set_user(&self, user: Identity) -> Result<(), RavenError> {
        if user.id.is_empty() {
            return Err(RavenError::invalid("identity id must not be empty"));
        }
        let mut inner = self.inner.write();
        if inner.user.as_ref() != Some(&user) {
            info!(user = %user.id, role = %user.role, "active user replaced");
        }
        inner.user = Some(user);
        Ok(())
    }

    /// Switch the active session.
    ///
    /// Rejects empty session ids.
    pub fn set_session(&self, session_id: SessionId) -> Result<(), RavenError> {
        if session_id.is_empty() {
            return Err(RavenError::invalid("session id must not be empty"));
        }
        let mut inner = self.inner.write();
        if inner.session_id != session_id {
            info!(session = %session_id, "active session switched");
        }
        inner.session_id = session_id;
        Ok(())
    }

    /// Current user, if one has been set
    pub fn user(&self) -> Option<Identity> {
        self.inner.read().user.clone()
    }

    /// Current user id, if one has been set
    pub fn user_id(&self) -> Option<UserId> {
        self.inner.read().user.as_ref().map(|u| u.id.clone())
    }

    /// Current viewer role; defaults to the most restrictive role when
    /// no user is set, matching the visibility policy default.
    pub fn role(&self) -> Role {
        self.inner.read().user.as_ref().map(|u| u.role).unwrap_or(Role::Red)
    }

    /// Active session id
    pub fn session_id(&self) -> SessionId {
        self.inner.read().session_id.clone()
    }
}

impl Default for IdentityContext {
    fn default() -> Self {
        Self::new(SessionId::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_user_id() {
        let ctx = IdentityContext::default();
        let err = ctx.set_user(Identity::new("", "Nobody", Role::Red));
        assert!(err.is_err());
        assert!(ctx.user().is_none());
    }

    #[test]
    fn rejects_empty_session_id() {
        let ctx = IdentityContext::default();
        assert!(ctx.set_session(SessionId::new("")).is_err());
        assert_eq!(ctx.session_id(), SessionId::default());
    }

    #[test]
    fn user_is_replaced_wholesale() {
        let ctx = IdentityContext::default();
        ctx.set_user(Identity::new("u1", "Alice", Role::Red)).unwrap();
        ctx.set_user(Identity::new("u2", "Bob", Role::White)).unwrap();
        assert_eq!(ctx.user_id(), Some(UserId::new("u2")));
        assert_eq!(ctx.role(), Role::White);
    }

    #[test]
    fn role_defaults_to_red_without_user() {
        assert_eq!(IdentityContext::default().role(), Role::Red);
    }
}
