//! Unified error handling for the Raven sync core
//!
//! One error type for the whole workspace, with constructor helpers so
//! call sites stay terse. No error here is fatal to a host process: the
//! worst failure mode anywhere in the core is a temporarily stale
//! unread count.

use serde::{Deserialize, Serialize};

/// Unified error type for all Raven core operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum RavenError {
    /// Invalid input or configuration
    #[error("Invalid: {message}")]
    Invalid {
        /// What was invalid
        message: String,
    },

    /// Resource not found
    #[error("Not found: {message}")]
    NotFound {
        /// What was not found
        message: String,
    },

    /// Stream or network transport failure
    #[error("Transport error: {message}")]
    Transport {
        /// What the transport reported
        message: String,
    },

    /// Wire payload could not be decoded
    #[error("Parse error: {message}")]
    Parse {
        /// Why decoding failed
        message: String,
    },

    /// An injected capability was used before being bound
    #[error("Capability not bound: {capability}")]
    CapabilityNotBound {
        /// Name of the missing capability
        capability: String,
    },

    /// A state subscriber callback failed
    #[error("Subscriber error: {message}")]
    Subscriber {
        /// What the subscriber reported
        message: String,
    },

    /// Internal invariant violation
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the violation
        message: String,
    },
}

impl RavenError {
    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a missing-capability error
    pub fn capability(name: impl Into<String>) -> Self {
        Self::CapabilityNotBound {
            capability: name.into(),
        }
    }

    /// Create a subscriber error
    pub fn subscriber(message: impl Into<String>) -> Self {
        Self::Subscriber {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_errors_name_the_capability() {
        let err = RavenError::capability("fetch_users");
        assert_eq!(err.to_string(), "Capability not bound: fetch_users");
    }
}
