//! Shared state shape and partial patches
//!
//! The host owns one [`GlobalState`]; children receive it at mount and
//! observe [`StatePatch`]es afterwards. Patches are shallow: a key that
//! is absent from a patch never touches the downstream value. The one
//! deliberate exception is config, which is itself shallow-merged field
//! by field via [`ConfigPatch`].

use raven_core::{Identity, SessionId, UserId};
use serde::{Deserialize, Serialize};

/// Presentation/config values handed down by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildConfig {
    /// Whether the session-reset control is offered
    pub show_reset: bool,
    /// Whether the sidebar is shown
    pub show_sidebar: bool,
    /// Theme primary color (CSS hex)
    pub primary_color: String,
}

impl Default for ChildConfig {
    fn default() -> Self {
        Self {
            show_reset: true,
            show_sidebar: true,
            primary_color: "#409EFF".to_string(),
        }
    }
}

impl ChildConfig {
    /// Shallow-merge a config patch. Returns whether anything changed.
    pub fn apply(&mut self, patch: &ConfigPatch) -> bool {
        let mut changed = false;
        if let Some(show_reset) = patch.show_reset {
            changed |= self.show_reset != show_reset;
            self.show_reset = show_reset;
        }
        if let Some(show_sidebar) = patch.show_sidebar {
            changed |= self.show_sidebar != show_sidebar;
            self.show_sidebar = show_sidebar;
        }
        if let Some(ref primary_color) = patch.primary_color {
            changed |= &self.primary_color != primary_color;
            self.primary_color = primary_color.clone();
        }
        changed
    }
}

/// Partial update to [`ChildConfig`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigPatch {
    /// New reset-control visibility, if changing
    #[serde(default)]
    pub show_reset: Option<bool>,
    /// New sidebar visibility, if changing
    #[serde(default)]
    pub show_sidebar: Option<bool>,
    /// New primary color, if changing
    #[serde(default)]
    pub primary_color: Option<String>,
}

/// The state shared between host and children
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalState {
    /// Active authenticated user, once known
    pub user: Option<Identity>,
    /// Active session (tenant partition)
    pub session_id: SessionId,
    /// Presentation config
    pub config: ChildConfig,
    /// Aggregate unread count last published by a child
    pub unread_count: u32,
    /// User the unread count was published for
    pub last_user: Option<UserId>,
    /// Enabled sub-application modules
    pub modules: Vec<String>,
    /// Route prefix the child is mounted under
    pub route_base: String,
}

/// Partial update to [`GlobalState`]
///
/// Every field is optional; only present keys are compared and merged.
/// Built with the `with_*` helpers:
///
/// ```
/// use raven_state::StatePatch;
/// let patch = StatePatch::new().with_unread_count(3);
/// assert!(!patch.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatePatch {
    /// Replacement user, if switching
    #[serde(default)]
    pub user: Option<Identity>,
    /// Replacement session, if switching
    #[serde(default)]
    pub session_id: Option<SessionId>,
    /// Config keys to merge, if any
    #[serde(default)]
    pub config: Option<ConfigPatch>,
    /// New aggregate unread count, if changing
    #[serde(default)]
    pub unread_count: Option<u32>,
    /// User the unread count belongs to, if changing
    #[serde(default)]
    pub last_user: Option<UserId>,
    /// Replacement module list, if changing
    #[serde(default)]
    pub modules: Option<Vec<String>>,
    /// Replacement route prefix, if changing
    #[serde(default)]
    pub route_base: Option<String>,
}

impl StatePatch {
    /// An empty patch (applies nothing)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the user key
    pub fn with_user(mut self, user: Identity) -> Self {
        self.user = Some(user);
        self
    }

    /// Set the session key
    pub fn with_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Set the config key
    pub fn with_config(mut self, config: ConfigPatch) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the unread-count key
    pub fn with_unread_count(mut self, unread_count: u32) -> Self {
        self.unread_count = Some(unread_count);
        self
    }

    /// Set the last-user key
    pub fn with_last_user(mut self, last_user: UserId) -> Self {
        self.last_user = Some(last_user);
        self
    }

    /// Set the module list key
    pub fn with_modules(mut self, modules: Vec<String>) -> Self {
        self.modules = Some(modules);
        self
    }

    /// Set the route prefix key
    pub fn with_route_base(mut self, route_base: impl Into<String>) -> Self {
        self.route_base = Some(route_base.into());
        self
    }

    /// Whether the patch carries no keys at all
    pub fn is_empty(&self) -> bool {
        self.user.is_none()
            && self.session_id.is_none()
            && self.config.is_none()
            && self.unread_count.is_none()
            && self.last_user.is_none()
            && self.modules.is_none()
            && self.route_base.is_none()
    }

    /// Merge this patch into `state`. Returns whether any key actually
    /// changed (shallow per-key equality).
    pub fn apply(&self, state: &mut GlobalState) -> bool {
        let mut changed = false;
        if let Some(ref user) = self.user {
            changed |= state.user.as_ref() != Some(user);
            state.user = Some(user.clone());
        }
        if let Some(ref session_id) = self.session_id {
            changed |= &state.session_id != session_id;
            state.session_id = session_id.clone();
        }
        if let Some(ref config) = self.config {
            changed |= state.config.apply(config);
        }
        if let Some(unread_count) = self.unread_count {
            changed |= state.unread_count != unread_count;
            state.unread_count = unread_count;
        }
        if let Some(ref last_user) = self.last_user {
            changed |= state.last_user.as_ref() != Some(last_user);
            state.last_user = Some(last_user.clone());
        }
        if let Some(ref modules) = self.modules {
            changed |= &state.modules != modules;
            state.modules = modules.clone();
        }
        if let Some(ref route_base) = self.route_base {
            changed |= &state.route_base != route_base;
            state.route_base = route_base.clone();
        }
        changed
    }
}
