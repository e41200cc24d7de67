//! Embedded / standalone host strategy
//!
//! A child either runs inside a host shell (and publishes state
//! upstream through the shared channel) or standalone (no upstream at
//! all). The strategy is chosen once at startup instead of probing the
//! environment at every call site.

use crate::channel::GlobalStateChannel;
use crate::state::StatePatch;
use tracing::trace;

/// How this child is attached to a host, decided at startup
pub enum HostBinding {
    /// Mounted inside a host shell that owns the shared state channel
    Embedded {
        /// The host's state channel
        channel: GlobalStateChannel,
    },
    /// Running standalone; upstream publication is a silent no-op
    Standalone,
}

impl HostBinding {
    /// Bind to a host channel
    pub fn embedded(channel: GlobalStateChannel) -> Self {
        Self::Embedded { channel }
    }

    /// Whether a host channel is bound
    pub fn is_embedded(&self) -> bool {
        matches!(self, Self::Embedded { .. })
    }

    /// Push a patch upstream. Returns whether the host state changed;
    /// always `false` when standalone.
    pub fn publish(&self, patch: StatePatch) -> bool {
        match self {
            Self::Embedded { channel } => channel.set_state(patch),
            Self::Standalone => {
                trace!("standalone binding; upstream publish skipped");
                false
            }
        }
    }

    /// The bound host channel, when embedded
    pub fn channel(&self) -> Option<&GlobalStateChannel> {
        match self {
            Self::Embedded { channel } => Some(channel),
            Self::Standalone => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standalone_publish_is_a_noop() {
        let binding = HostBinding::Standalone;
        assert!(!binding.publish(StatePatch::new().with_unread_count(3)));
        assert!(!binding.is_embedded());
    }

    #[test]
    fn embedded_publish_reaches_the_host_channel() {
        let channel = GlobalStateChannel::default();
        let binding = HostBinding::embedded(channel.clone());

        assert!(binding.publish(StatePatch::new().with_unread_count(3)));
        assert_eq!(channel.snapshot().unread_count, 3);
    }
}
