//! Presentation config bridge
//!
//! Holds the host-supplied presentation values and exposes them to
//! consumers. Orthogonal to identity: config changes never touch the
//! user or session.

use crate::state::{ChildConfig, ConfigPatch};
use parking_lot::RwLock;
use tracing::debug;

/// Live presentation config for one child application instance
pub struct ConfigBridge {
    inner: RwLock<ChildConfig>,
}

impl ConfigBridge {
    /// Create a bridge seeded with defaults
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(ChildConfig::default()),
        }
    }

    /// Shallow-merge a patch from the host. Returns whether anything
    /// changed.
    pub fn apply(&self, patch: &ConfigPatch) -> bool {
        let mut config = self.inner.write();
        let changed = config.apply(patch);
        if changed {
            debug!(primary_color = %config.primary_color, "config updated");
        }
        changed
    }

    /// Current config snapshot
    pub fn current(&self) -> ChildConfig {
        self.inner.read().clone()
    }
}

impl Default for ConfigBridge {
    fn default() -> Self {
        Self::new()
    }
}
